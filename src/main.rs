/*
Copyright 2026 The rv32asm Authors

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use rv32asm::assemble;
use rv32asm::file_reader::AsmFileReader;

#[derive(Parser)]
#[command(name = "rv32asm", version, about = "Assembler for RV32IMAC producing flat binary output")]
struct Opts {
    /// Assembly source file
    input: PathBuf,

    /// Output binary path
    #[arg(short, long, default_value = "bb.out")]
    output: PathBuf,

    /// Enable the C-extension compression pass
    #[arg(long)]
    compress: bool,

    /// Increase logging verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();

    let reader = AsmFileReader;
    match assemble(&opts.input, opts.compress, &reader) {
        Ok(binary) => {
            if let Err(e) = std::fs::write(&opts.output, binary) {
                eprintln!("failed to write {}: {e}", opts.output.display());
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
