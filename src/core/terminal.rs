use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static LINK_ICON: Emoji<'_, '_> = Emoji("🔗 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_link(label: &str, url: &str) {
    println!(
        "  {} {}: {}",
        LINK_ICON,
        style(label).bold(),
        style(url).underlined().cyan()
    );
}

pub fn print_banner() {
    println!();
    println!(
        "  {}{}",
        style("lead").bold().green(),
        style("relay").bold().cyan()
    );
    println!(
        "  {}\n",
        style("Import leads, share them fairly, send the first message.").dim()
    );
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Info(String),
    Text(String),
    Hint(String, String),
    Blank,
}

/// A titled block of aligned help lines.
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn info(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Info(msg.to_string()));
        self
    }

    pub fn text(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Text(msg.to_string()));
        self
    }

    pub fn hint(mut self, cmd: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Hint(cmd.to_string(), description.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    fn render(&self) -> Vec<String> {
        let width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                GuideLine::Command(name, _) => Some(name.chars().count()),
                GuideLine::Status(label, _) => Some(label.chars().count() + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        let mut out = vec![format!("\n {}", style(&self.title).bold().underlined())];
        for line in &self.lines {
            out.push(match line {
                GuideLine::Command(name, desc) => format!(
                    "   {}  {}",
                    style(format!("{:<width$}", name, width = width)).green(),
                    desc
                ),
                GuideLine::Status(label, value) => format!(
                    "   {}  {}",
                    style(format!("{:<width$}", format!("{}:", label), width = width)).cyan(),
                    value
                ),
                GuideLine::Info(msg) => format!("   {} {}", INFO_ICON, msg),
                GuideLine::Text(msg) => format!("   {}", msg),
                GuideLine::Hint(cmd, desc) if desc.is_empty() => {
                    format!("   $ {}", style(cmd).cyan())
                }
                GuideLine::Hint(cmd, desc) => {
                    format!("   $ {}  {}", style(cmd).cyan(), style(desc).dim())
                }
                GuideLine::Blank => String::new(),
            });
        }
        out
    }

    pub fn print(self) {
        for line in self.render() {
            println!("{}", line);
        }
    }
}
