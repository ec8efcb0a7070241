use clap::Args;
use tiffin_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    /// Account email
    #[arg(long)]
    email: String,

    /// Account password
    #[arg(long, env = "TIFFIN_PASSWORD", hide_env_values = true)]
    password: String,
}

pub(crate) async fn run(context: &AppContext, args: &LoginArgs) -> Result<(), String> {
    let session = context
        .api
        .login(&args.email, &args.password)
        .await
        .map_err(|error| format!("failed to sign in: {}", error.user_message()))?;

    if let Some(role) = session.role() {
        println!("role: {role:?}");
    }

    if let Some(token) = session.token() {
        println!("api_token: {token}");
        println!("export it as TIFFIN_API_TOKEN to use it for later commands");
    }

    Ok(())
}
