//! Terminal review of pending writes.

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};

use fluxit_sync::{
    Confirmation, Confirmer, DiffLineKind, PersistError, Preview, Review, UnifiedDiff,
};

use crate::prompt::is_interrupt;

const SEPARATOR: &str = "--------------------";

/// Diff text with added lines green, removed red and hunk headers cyan.
pub fn render_diff(diff: &UnifiedDiff, color: bool) -> String {
    let mut out = String::new();
    for line in diff.iter() {
        let text = if !color {
            line.text.clone()
        } else {
            match line.kind {
                DiffLineKind::Added => line.text.green().to_string(),
                DiffLineKind::Removed => line.text.red().to_string(),
                DiffLineKind::Hunk => line.text.cyan().to_string(),
                DiffLineKind::FileHeader | DiffLineKind::Context => line.text.clone(),
            }
        };
        out.push_str(&text);
        out.push('\n');
    }
    out
}

/// Prints the preview and asks on the terminal.
pub struct TerminalConfirmer {
    theme: ColorfulTheme,
    color: bool,
}

impl TerminalConfirmer {
    pub fn new(color: bool) -> Self {
        TerminalConfirmer {
            theme: ColorfulTheme::default(),
            color,
        }
    }

    fn present(&self, review: &Review<'_>) {
        println!("{SEPARATOR}");
        println!("Processing file: {}", review.path.display());
        match review.preview {
            Preview::Diff(diff) => {
                println!("Proposed changes (diff):");
                print!("{}", render_diff(diff, self.color));
            }
            Preview::NewContent(content) => {
                println!("Rendered content:");
                println!("{content}");
            }
        }
        println!("{SEPARATOR}");
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, review: &Review<'_>) -> Result<Confirmation, PersistError> {
        self.present(review);

        let message = if review.exists {
            format!(
                "File exists. Overwrite {} with the changes shown above?",
                review.path.display()
            )
        } else {
            format!("Save file {}?", review.path.display())
        };

        match Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(true)
            .interact_opt()
        {
            Ok(Some(true)) => Ok(Confirmation::Approved),
            Ok(Some(false)) => Ok(Confirmation::Declined),
            Ok(None) => Ok(Confirmation::Interrupted),
            Err(e) if is_interrupt(&e) => Ok(Confirmation::Interrupted),
            Err(e) => Err(PersistError::Prompt(e.to_string())),
        }
    }
}
