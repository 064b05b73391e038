pub mod health;
pub mod score;
pub mod scorers;

use super::args::{Cli, Command};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Score(args) => score::cmd_score(args).await,
        Command::Health(args) => health::cmd_health(args),
        Command::Scorers => scorers::cmd_scorers(),
    }
}
