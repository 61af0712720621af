use super::console::{render, ConsoleSink};
use super::*;
use osfetch_core::events::{BatchEvent, EventSink, Stage};
use std::path::Path;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_descriptors_in_order() {
    let cli = parse(&["osfetch", "ubuntu.toml", "alpine.json"]);
    assert_eq!(cli.descriptors, vec!["ubuntu.toml", "alpine.json"]);
    assert!(cli.output_dir.is_none());
    assert!(cli.deadline.is_none());
}

#[test]
fn cli_parse_output_dir_and_deadline() {
    let cli = parse(&["osfetch", "-o", "/srv/isos", "--deadline", "3600", "debian.toml"]);
    assert_eq!(cli.output_dir.as_deref(), Some(Path::new("/srv/isos")));
    assert_eq!(cli.deadline, Some(3600));
    assert_eq!(cli.descriptors, vec!["debian.toml"]);
}

#[test]
fn cli_parse_requires_descriptor() {
    assert!(Cli::try_parse_from(["osfetch"]).is_err());
    assert!(Cli::try_parse_from(["osfetch", "--deadline", "soon", "a.toml"]).is_err());
}

#[test]
fn console_lines() {
    assert_eq!(
        render(&BatchEvent::Descriptor {
            name: "linux".into(),
            urls: 2
        }),
        "linux"
    );
    assert_eq!(
        render(&BatchEvent::Skipped {
            url: "https://x.example/a.iso".into(),
            path: "linux/x86_64/a.iso".into(),
        }),
        "  \"linux/x86_64/a.iso\" already exists"
    );
    assert_eq!(
        render(&BatchEvent::Downloaded {
            url: "https://x.example/a.iso".into(),
            path: "linux/x86_64/a.iso".into(),
            bytes: 42,
        }),
        "  42 bytes written"
    );
    assert_eq!(
        render(&BatchEvent::Failed {
            url: "https://x.example/a.iso".into(),
            stage: Stage::CreateDir,
            error: "permission denied".into(),
        }),
        "  Error creating directory: permission denied"
    );
}

#[test]
fn console_sink_writes_one_line_per_event() {
    let mut sink = ConsoleSink::new(Vec::new());
    sink.emit(BatchEvent::Descriptor {
        name: "alpine".into(),
        urls: 1,
    });
    sink.emit(BatchEvent::LoadFailed {
        identifier: "x.toml".into(),
        error: "not found".into(),
    });
    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out, "alpine\nError loading operating system: not found\n");
}
