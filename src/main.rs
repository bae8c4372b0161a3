use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use pickmytunes::{cli, config, error, types::Provider};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in with a provider and pick albums from your library
    Login(LoginOptions),

    /// Finish a login with an authorization code copied from the browser
    Resume(ResumeOptions),

    /// Forget any login that is still pending
    Reset,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    /// Music catalog to log in with
    #[clap(long, short, value_enum)]
    pub provider: Provider,

    /// Albums per pick
    #[clap(long = "count", short = 'n')]
    pub count: Option<usize>,

    /// Print the authorization URL instead of opening a browser
    #[clap(long)]
    pub no_browser: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ResumeOptions {
    /// Value of the `code` query parameter the provider redirected to
    #[clap(long)]
    pub code: String,

    /// Albums per pick
    #[clap(long = "count", short = 'n')]
    pub count: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Login(opt) => cli::login(opt.provider, opt.count, !opt.no_browser).await,
        Command::Resume(opt) => cli::resume(opt.code, opt.count).await,
        Command::Reset => cli::reset().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
