use anyhow::Context;
use stackd_util::Notification;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// One line offered to the chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: u32,
    pub key: String,
    pub line: String,
}

/// Every action of every displayed notification, top to bottom.
pub fn menu_entries(displayed: &[Notification]) -> Vec<MenuEntry> {
    displayed
        .iter()
        .flat_map(|n| {
            n.actions.iter().map(move |action| MenuEntry {
                id: n.id,
                key: action.id.to_string(),
                line: format!("#{} [{}]", action.label, n.app_name),
            })
        })
        .collect()
}

/// The entry whose line the chooser printed, if any.
pub fn selected<'a>(output: &str, entries: &'a [MenuEntry]) -> Option<&'a MenuEntry> {
    let choice = output.lines().next()?.trim_end();
    entries.iter().find(|entry| entry.line == choice)
}

/// Run the chooser command with the entries on its standard input.
///
/// Resolves to `None` when the user picked nothing.
pub async fn choose(command: &str, entries: Vec<MenuEntry>) -> anyhow::Result<Option<MenuEntry>> {
    let argv = shell_words::split(command)
        .with_context(|| format!("Invalid chooser command {command:?}"))?;
    let Some((program, args)) = argv.split_first() else {
        anyhow::bail!("Chooser command is empty");
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start {program}"))?;

    let input: String = entries.iter().map(|e| format!("{}\n", e.line)).collect();
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(selected(&stdout, &entries).cloned())
}
