//! Log output shared by the binaries.

use env_logger::Builder;
use std::env;
use std::io::Write;

/// Installs a logger that prefixes every line with a UTC timestamp, the level
/// and the module. `RUST_LOG` selects what is shown; the default is `info`.
pub fn init() {
    let mut builder = Builder::new();
    builder.format(|buf, record| {
        let t = chrono::Utc::now();
        writeln!(
            buf,
            "{} {} {}: {}",
            t.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or("-"),
            record.args()
        )
    });
    match env::var("RUST_LOG") {
        Ok(filters) => builder.parse_filters(&filters),
        Err(_) => builder.parse_filters("info"),
    };

    if builder.try_init().is_err() {
        eprintln!("logger already initialized");
    }
}
