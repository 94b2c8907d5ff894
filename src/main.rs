use gossamer::Backdrop;

fn main() {
    env_logger::init();

    // Weaker devices should pass a lower count (the original page used 800
    // on small screens and 600 on low-power hardware).
    let count: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1500);

    if let Err(e) = Backdrop::new().with_particle_count(count).run() {
        eprintln!("gossamer: {}", e);
        std::process::exit(1);
    }
}
