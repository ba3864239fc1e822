use crate::client::Client;
use advisor_application::{CallbackStatus, NavigationReport, View};
use anyhow::Result;
use colored::Colorize;

pub fn login(client: &Client) {
    let url = client.config.google_login_url();
    match url {
        Ok(url) => {
            println!("{}", "Sign in with Google:".bright_cyan());
            println!("  {}", url);
            println!();
            println!("After signing in, pass the page you land on to `advisor open <url>`.");
        }
        Err(e) => eprintln!("{}", format!("Cannot build sign-in URL: {}", e).red()),
    }
}

/// Opens a client location and follows it to a settled view.
pub async fn open(client: &Client, location: &str) -> Result<()> {
    let report = client.controller.start(location).await?;
    print_report(&report);
    Ok(())
}

pub async fn whoami(client: &Client) -> Result<()> {
    client.require_login().await?;
    let Some(identity) = client.auth.identity() else {
        anyhow::bail!("Not signed in.");
    };

    println!("{}", identity.display_name.bright_green());
    if let Some(email) = &identity.email {
        println!("  Email:   {}", email);
    }
    println!("  Google:  {}", linked(identity.integrations.google_linked));
    println!("  HubSpot: {}", linked(identity.integrations.hubspot_linked));
    if !client.auth.link_state().has_crm() {
        println!(
            "{}",
            "  HubSpot features are unavailable until HubSpot is connected.".bright_black()
        );
    }
    Ok(())
}

pub async fn logout(client: &Client) {
    client.auth.logout().await;
    println!("{}", "Signed out.".green());
}

fn linked(flag: bool) -> colored::ColoredString {
    if flag {
        "connected".green()
    } else {
        "not connected".yellow()
    }
}

fn print_report(report: &NavigationReport) {
    for outcome in &report.callbacks {
        let line = match outcome.status {
            CallbackStatus::Success => outcome.notice.green(),
            CallbackStatus::Error => outcome.notice.red(),
            CallbackStatus::Processing => outcome.notice.normal(),
        };
        println!("{}", line);
    }

    if let Some(url) = &report.external_redirect {
        println!("{}", "Continue in your browser:".bright_cyan());
        println!("  {}", url);
        return;
    }

    let view = match &report.view {
        View::Loading => "Loading".to_string(),
        View::Login { google_login_url } => format!("Login (sign in at {})", google_login_url),
        View::LoginSuccess => "Login success".to_string(),
        View::HubSpotCallback => "HubSpot callback".to_string(),
        View::Chat => "Chat".to_string(),
        View::ErrorView => "Login error".to_string(),
    };
    println!("{} {}", "View:".bright_black(), view);
    println!("{} {}", "Location:".bright_black(), report.location);
}
