use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::process::Command;

use crate::feed::types::FeedItem;

/// Emulators probed in order; first one on PATH wins. Each needs flags
/// that make it block until the command finishes and a way to hand it
/// the script to execute.
const TERMINALS: &[(&str, &[&str])] = &[
    ("gnome-terminal", &["--wait", "--"]),
    ("xfce4-terminal", &["--disable-server", "--wait", "-e"]),
    ("konsole", &["--nofork", "-e"]),
    ("xterm", &["-e"]),
    ("terminator", &["-e"]),
];

/// Run the download command in a freshly spawned terminal window so the
/// user sees the command and its progress. Falls back to running the
/// wrapper script inline when no emulator is available. The terminal's
/// own exit status is advisory only; the caller decides success by
/// checking for the output file.
pub async fn run_in_terminal(item: &FeedItem, argv: &[String], dest_dir: &Path) -> Result<()> {
    let script = wrapper_script(item, argv, dest_dir);

    let mut file = tempfile::Builder::new()
        .prefix("tubecast_")
        .suffix(".sh")
        .tempfile()
        .context("failed to create wrapper script")?;
    file.write_all(script.as_bytes())
        .context("failed to write wrapper script")?;
    file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755))
            .context("failed to mark wrapper script executable")?;
    }

    let script_path = file.path().to_path_buf();

    let found = TERMINALS
        .iter()
        .find(|(name, _)| which::which(name).is_ok());

    let status = match found {
        Some((term, args)) => {
            tracing::info!(terminal = %term, "spawning terminal");
            let mut cmd = Command::new(term);
            cmd.args(*args);
            if *term == "konsole" {
                // konsole -e takes a single command string
                cmd.arg(format!("/bin/bash {}", script_path.display()));
            } else {
                cmd.arg(&script_path);
            }
            cmd.status().await
                .with_context(|| format!("failed to run terminal: {term}"))?
        }
        None => {
            tracing::warn!("no supported terminal emulator found; running download inline");
            Command::new("bash")
                .arg(&script_path)
                .status()
                .await
                .context("failed to run wrapper script inline")?
        }
    };

    if !status.success() {
        tracing::warn!(?status, "download command exited non-zero");
    }

    // file drops here, removing the wrapper script
    Ok(())
}

fn wrapper_script(item: &FeedItem, argv: &[String], dest_dir: &Path) -> String {
    let cmd = argv
        .iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "#!/bin/bash\n\
         echo \"==================================================\"\n\
         echo {title}\n\
         echo {url}\n\
         echo \"==================================================\"\n\
         echo \"\"\n\
         echo \"Command to run:\"\n\
         echo {cmd_display}\n\
         echo \"\"\n\
         echo \"Starting download...\"\n\
         cd {dest}\n\
         {cmd}\n\
         EXIT_CODE=$?\n\
         if [ $EXIT_CODE -eq 0 ]; then\n\
         \techo \"Download Success!\"\n\
         else\n\
         \techo \"Download Failed! Code: $EXIT_CODE\"\n\
         fi\n\
         exit $EXIT_CODE\n",
        title = shell_quote(&format!("Video: {}", item.title)),
        url = shell_quote(&format!("URL:   {}", item.link)),
        cmd_display = shell_quote(&cmd),
        dest = shell_quote(&dest_dir.display().to_string()),
        cmd = cmd,
    )
}

/// Single-quote an argument for bash unless it is plainly safe.
fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '%'));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
