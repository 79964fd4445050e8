//! Stderr logging setup: timestamped, level gated by `--debug`.

pub fn init(debug: bool) {
    let level = if debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .expect("logger already initialized");
}
