use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mapmerge_sdk::{ElementAction, ElementId, Side};

#[derive(Parser)]
#[command(
    name = "mapmerge",
    about = "MapMerge: three-way reconciliation of map element edits",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with reconciliation settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the status of every element and overall progress
    Status(StatusArgs),
    /// Show the three-way comparison of one element
    Diff(DiffArgs),
    /// Print the submission request for one element
    Resolve(ResolveArgs),
    /// Submit every element that is fully resolved
    Submit(SubmitArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Working set file
    pub input: PathBuf,
}

#[derive(Args)]
pub struct DiffArgs {
    pub input: PathBuf,
    /// Element id, e.g. `w123`
    pub element: ElementId,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub input: PathBuf,
    pub element: ElementId,
    /// Extra choices as `key=ours` or `key=theirs`; `$map` is the geometry
    #[arg(long = "choose", value_parser = parse_choice)]
    pub choose: Vec<(String, Side)>,
    /// Keep/delete decision for an element one branch deleted
    #[arg(long)]
    pub decision: Option<DecisionArg>,
}

#[derive(Args)]
pub struct SubmitArgs {
    pub input: PathBuf,
    /// Write submission receipts here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DecisionArg {
    Keep,
    Delete,
}

impl From<DecisionArg> for ElementAction {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Keep => ElementAction::Keep,
            DecisionArg::Delete => ElementAction::Delete,
        }
    }
}

fn parse_choice(s: &str) -> Result<(String, Side), String> {
    let (key, side) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected key=ours|theirs, got {s:?}"))?;
    if key.is_empty() {
        return Err("empty key".into());
    }
    let side = match side {
        "ours" => Side::Ours,
        "theirs" => Side::Theirs,
        other => return Err(format!("unknown side {other:?}, expected ours or theirs")),
    };
    Ok((key.to_string(), side))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["mapmerge", "status", "set.json"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.input, PathBuf::from("set.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_element() {
        let cli = Cli::try_parse_from(["mapmerge", "diff", "set.json", "w12"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.element, ElementId::way(12));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn bad_element_id_rejected() {
        assert!(Cli::try_parse_from(["mapmerge", "diff", "set.json", "x12"]).is_err());
    }

    #[test]
    fn parse_resolve_choices() {
        let cli = Cli::try_parse_from([
            "mapmerge", "resolve", "set.json", "n1",
            "--choose", "name=ours", "--choose", "$map=theirs", "--choose", "a=b=theirs",
        ])
        .unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(
                args.choose,
                vec![
                    ("name".to_string(), Side::Ours),
                    ("$map".to_string(), Side::Theirs),
                    ("a=b".to_string(), Side::Theirs),
                ]
            );
            assert_eq!(args.decision, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn bad_choice_rejected() {
        assert!(Cli::try_parse_from(["mapmerge", "resolve", "s.json", "n1", "--choose", "name"]).is_err());
        assert!(Cli::try_parse_from(["mapmerge", "resolve", "s.json", "n1", "--choose", "name=mine"]).is_err());
        assert!(Cli::try_parse_from(["mapmerge", "resolve", "s.json", "n1", "--choose", "=ours"]).is_err());
    }

    #[test]
    fn parse_resolve_decision() {
        let cli = Cli::try_parse_from(["mapmerge", "resolve", "s.json", "w3", "--decision", "delete"]).unwrap();
        if let Command::Resolve(args) = cli.command {
            assert_eq!(args.decision, Some(DecisionArg::Delete));
            assert_eq!(ElementAction::from(DecisionArg::Delete), ElementAction::Delete);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_submit_out() {
        let cli = Cli::try_parse_from(["mapmerge", "submit", "s.json", "-o", "out.json"]).unwrap();
        if let Command::Submit(args) = cli.command {
            assert_eq!(args.out, Some(PathBuf::from("out.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "mapmerge", "--verbose", "--format", "json", "--config", "m.toml", "status", "s.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("m.toml")));
    }
}
