use jstub::jvm::class_graph::{ClassGraph, ClassGraphArenas};
use jstub::program::ProgramSpec;
use jstub::synth::{self, Settings, Synthesizer};

use clap::{Arg, Command};
use std::process;

fn main() -> Result<(), synth::Error> {
    env_logger::init();

    let matches = Command::new("Placeholder body synthesizer")
        .version(clap::crate_version!())
        .about("Synthesize conservative, verifiable bodies for placeholder library methods")
        .arg(
            Arg::new("guard-class")
                .long("guard-class")
                .value_name("CLASS_NAME")
                .default_value("jstub/Guard")
                .help("Class holding the opaque guard flag (eg. `foo/bar/Guard`)"),
        )
        .arg(
            Arg::new("guard-field")
                .long("guard-field")
                .value_name("FIELD_NAME")
                .default_value("guard")
                .help("Name of the static boolean guard flag"),
        )
        .arg(
            Arg::new("INPUT")
                .help("JSON description of the classes and method summaries")
                .required(true)
                .index(1),
        )
        .get_matches();

    let settings = Settings::new(
        get_arg(&matches, "guard-class"),
        get_arg(&matches, "guard-field"),
    )?;

    let input = get_arg(&matches, "INPUT");
    log::info!("Reading '{}'", input);
    let program = ProgramSpec::from_path(&input)?;

    let class_graph_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_graph_arenas);
    let java = class_graph.insert_java_library()?;
    let summaries = program.load_into(&class_graph, &java)?;

    // Failures are reported per method, the others still get their bodies
    let synthesizer = Synthesizer::new(&class_graph, java, settings);
    let mut failures = 0;
    for (method, summary) in &summaries {
        match synthesizer.synthesize_and_attach(*method, summary) {
            Ok(body) => println!("// {:?}\n{}", method, body),
            Err(err) => {
                log::error!("Skipping {:?}: {}", method, err);
                failures += 1;
            }
        }
    }

    if let Some(guard) = synthesizer.existing_guard_class() {
        for method in guard.class.methods() {
            if let Some(body) = method.body() {
                println!("// {:?}\n{}", method, body);
            }
        }
    }

    if failures > 0 {
        log::error!("{} of {} methods failed", failures, summaries.len());
        process::exit(1);
    }
    Ok(())
}

fn get_arg(matches: &clap::ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}
