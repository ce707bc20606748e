use clap::{Parser, Subcommand};
use mapperfs::namespace::ProjectionStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mapperfs", version)]
#[command(about = "Mount a virtual directory tree built from a list of real file paths")]
pub struct Args {
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        help = "How real paths become virtual paths [default: from config, else copy]"
    )]
    pub mapper: Option<ProjectionStrategy>,

    #[arg(
        short,
        long,
        global = true,
        help = "Read the input once instead of reloading when it changes"
    )]
    pub once: bool,

    #[arg(short = 'n', long, global = true, help = "Print the namespace instead of mounting it")]
    pub dry_run: bool,

    #[arg(short, long, global = true, help = "Log reloads and mount events")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log every filesystem operation")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Mount the paths listed in one or more files ('-' for stdin)")]
    Mount {
        #[arg(help = "Directory to mount on")]
        mount_point: PathBuf,
        #[arg(required = true, help = "Listing files, one path per line")]
        inputs: Vec<PathBuf>,
    },
    #[command(about = "Mount real paths given on the command line")]
    Files {
        #[arg(help = "Directory to mount on")]
        mount_point: PathBuf,
        #[arg(required = true, help = "Real paths to expose")]
        paths: Vec<String>,
    },
    #[command(about = "Mount the files of a Rhythmbox playlist")]
    Playlist {
        #[arg(help = "Rhythmbox playlists.xml file")]
        file: PathBuf,
        #[arg(help = "Name of the playlist")]
        playlist: String,
        #[arg(help = "Directory to mount on")]
        mount_point: PathBuf,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    #[command(about = "Show current configuration values")]
    Show,
    #[command(about = "Show config file path")]
    Path,
    #[command(about = "Write a config file with the default values")]
    Init {
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mount_with_global_flags() {
        let args = Args::try_parse_from([
            "mapperfs", "mount", "/mnt/x", "a.txt", "-", "--mapper", "flat", "-o",
        ])
        .unwrap();

        assert_eq!(args.mapper, Some(ProjectionStrategy::Flatten));
        assert!(args.once);
        match args.command {
            Commands::Mount {
                mount_point,
                inputs,
            } => {
                assert_eq!(mount_point, PathBuf::from("/mnt/x"));
                assert_eq!(inputs, vec![PathBuf::from("a.txt"), PathBuf::from("-")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_playlist() {
        let args =
            Args::try_parse_from(["mapperfs", "-m", "common", "playlist", "p.xml", "Road Trip", "/mnt"])
                .unwrap();
        assert_eq!(args.mapper, Some(ProjectionStrategy::CommonPrefixTrim));
        assert!(matches!(
            args.command,
            Commands::Playlist { ref playlist, .. } if playlist == "Road Trip"
        ));
    }

    #[test]
    fn test_mount_requires_input() {
        assert!(Args::try_parse_from(["mapperfs", "mount", "/mnt"]).is_err());
        assert!(Args::try_parse_from(["mapperfs", "files", "/mnt"]).is_err());
    }

    #[test]
    fn test_unknown_mapper_is_rejected() {
        assert!(Args::try_parse_from(["mapperfs", "-m", "sideways", "files", "/mnt", "/a"]).is_err());
    }
}
