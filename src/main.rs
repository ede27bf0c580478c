use std::io;

fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = vlog_tui::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Vlog-TUI {}", vlog_tui::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Vlog-TUI - Browse, comment on, and upload vlogs from the terminal.\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message\n  --list               Print the vlog feed and exit"
                );
                saw_flag = true;
            }
            "--list" => {
                saw_flag = true;
                let mut stdout = io::stdout().lock();
                if let Err(err) = vlog_tui::print_feed(&mut stdout) {
                    eprintln!("Listing vlogs failed: {err:?}");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
    }
    saw_flag
}
