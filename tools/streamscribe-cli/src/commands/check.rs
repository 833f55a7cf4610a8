//! Check system capabilities.

#[cfg(target_os = "linux")]
pub fn run() -> anyhow::Result<()> {
    use streamscribe_platform_linux::{detect_display_server, DisplayServer};

    println!("Stream Scribe System Check");
    println!("{}", "=".repeat(50));

    match detect_display_server() {
        DisplayServer::Wayland => println!("[OK] Display server: Wayland"),
        DisplayServer::X11 => println!("[WARN] Display server: X11 (portal capture needs Wayland)"),
        DisplayServer::Unknown => println!("[WARN] Display server: Unknown"),
    }

    let capabilities = streamscribe_platform_linux::permissions::check_capabilities();
    println!();
    streamscribe_platform_linux::permissions::print_capability_report(&capabilities);

    let all_required_ok = capabilities
        .iter()
        .filter(|c| c.required)
        .all(|c| c.available);

    println!();
    if all_required_ok {
        println!("All required capabilities are available. Stream Scribe is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
        println!("The test-pattern backend still works: streamscribe host --backend test-pattern");
    }

    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn run() -> anyhow::Result<()> {
    println!("Stream Scribe System Check");
    println!("{}", "=".repeat(50));
    println!("[WARN] Portal capture is only available on Linux");
    println!("The test-pattern backend still works: streamscribe host --backend test-pattern");
    Ok(())
}
