use std::process::exit;

use structopt::StructOpt;

use eagle::cli::{run, Opt};

pub fn main() {
    let opt = Opt::from_args();
    eagle::logging::init(opt.debug);

    exit(match run(opt) {
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
        _ => 0,
    })
}
