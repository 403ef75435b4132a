use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(about = "service marketplace backend: jobs, bookings and providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run migrations, then serve HTTP until SIGINT/SIGTERM (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["service-hub"]).unwrap();
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn migrate_subcommand_parses() {
        let cli = Cli::try_parse_from(["service-hub", "migrate"]).unwrap();
        assert_eq!(cli.command(), &Command::Migrate);
        assert!(Cli::try_parse_from(["service-hub", "seed"]).is_err());
    }
}
