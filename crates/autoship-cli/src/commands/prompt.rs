use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

use super::DeployKind;

pub(crate) fn text(prompt: &str, default: Option<&str>) -> anyhow::Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    Ok(input.interact_text()?.trim().to_owned())
}

pub(crate) fn secret(prompt: &str) -> anyhow::Result<String> {
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?)
}

pub(crate) fn deploy_kind() -> anyhow::Result<DeployKind> {
    let theme = ColorfulTheme::default();
    let wants_deploy = Confirm::with_theme(&theme)
        .with_prompt("Deploy the image now?")
        .default(false)
        .interact()?;
    if !wants_deploy {
        return Ok(DeployKind::Skip);
    }

    let items: Vec<String> = DeployKind::CHOICES.iter().map(|k| k.to_string()).collect();
    let selection = Select::with_theme(&theme)
        .with_prompt("Deployment type")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(DeployKind::CHOICES[selection])
}
