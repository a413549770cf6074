use std::path::{Path, PathBuf};
use std::process::{Command, Output};

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn leadrelay_binary_path() -> TestResult<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_leadrelay") {
        return Ok(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_leadrelay") {
        return Ok(PathBuf::from(path));
    }

    let candidate = PathBuf::from("target")
        .join("debug")
        .join(if cfg!(windows) { "leadrelay.exe" } else { "leadrelay" });
    if candidate.exists() {
        return Ok(candidate);
    }

    Err("Could not locate leadrelay test binary path".into())
}

struct Workspace {
    data_dir: tempfile::TempDir,
    bin: PathBuf,
}

impl Workspace {
    fn new() -> TestResult<Self> {
        Ok(Self {
            data_dir: tempfile::tempdir()?,
            bin: leadrelay_binary_path()?,
        })
    }

    fn path(&self) -> &Path {
        self.data_dir.path()
    }

    fn run(&self, args: &[&str]) -> TestResult<Output> {
        Ok(Command::new(&self.bin)
            .args(args)
            .current_dir(self.path())
            .env("LEADRELAY_DATA_DIR", self.path())
            .env_remove("GEMINI_API_KEY")
            .env_remove("LEADRELAY_LOG")
            .output()?)
    }

    /// Run and require success, returning stdout.
    fn ok(&self, args: &[&str]) -> TestResult<String> {
        let out = self.run(args)?;
        if !out.status.success() {
            return Err(format!(
                "leadrelay {:?} failed:\nstdout: {}\nstderr: {}",
                args,
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn fails(&self, args: &[&str]) -> TestResult<String> {
        let out = self.run(args)?;
        assert!(!out.status.success(), "leadrelay {:?} unexpectedly succeeded", args);
        Ok(String::from_utf8_lossy(&out.stderr).into_owned())
    }

    fn login(&self, email: &str) -> TestResult<String> {
        self.ok(&["login", "--email", email, "--password", "secret"])
    }
}

fn csv_rows(path: &Path) -> TestResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[test]
fn commands_require_install() -> TestResult<()> {
    let ws = Workspace::new()?;
    let err = ws.fails(&["base", "list"])?;
    assert!(err.contains("leadrelay install"), "stderr: {}", err);
    Ok(())
}

#[test]
fn unknown_command_exits_with_failure() -> TestResult<()> {
    let ws = Workspace::new()?;
    ws.ok(&["install"])?;
    let err = ws.fails(&["frobnicate"])?;
    assert!(err.contains("Unknown command: frobnicate"), "stderr: {}", err);
    Ok(())
}

#[test]
fn import_distribute_dispatch_export() -> TestResult<()> {
    let ws = Workspace::new()?;
    ws.ok(&["install", "--admin-email", "boss@example.com", "--admin-name", "Boss"])?;
    assert!(ws.path().join("config.toml").exists());

    ws.fails(&["stats"])?;
    ws.login("boss@example.com")?;
    ws.ok(&["whoami"])?;

    let out = ws.login("ana@example.com")?;
    assert!(out.contains("Registered"), "stdout: {}", out);
    ws.login("bruno@example.com")?;
    // Agents cannot run admin commands.
    ws.fails(&["stats"])?;

    ws.login("boss@example.com")?;
    // Wrong password is rejected.
    ws.fails(&["login", "--email", "boss@example.com", "--password", "nope"])?;
    // Admins have no queue.
    ws.fails(&["queue"])?;

    ws.ok(&["base", "create", "--name", "Promo", "--copy", "Oi [NOME], tudo bem?"])?;
    let list = ws.ok(&["base", "list"])?;
    assert!(list.contains("Promo"), "stdout: {}", list);

    let out = ws.ok(&[
        "import",
        "--base",
        "promo",
        "--text",
        "Lucas,(11) 99999-0000\nFernanda,11888880001\nBad,123",
    ])?;
    assert!(out.contains("Imported 2 leads"), "stdout: {}", out);
    assert!(out.contains("row 3"), "stdout: {}", out);

    let export_path = ws.path().join("promo.csv");
    let export_arg = export_path.to_string_lossy().into_owned();
    ws.ok(&["export", "--base", "Promo", "--out", &export_arg])?;
    let rows = csv_rows(&export_path)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Name");
    assert!(rows[1..].iter().all(|r| r[2] == "PENDING"));
    let agents: Vec<&str> = rows[1..].iter().map(|r| r[3].as_str()).collect();
    assert!(agents.contains(&"ana"));
    assert!(agents.contains(&"bruno"));

    ws.login("ana@example.com")?;
    let out = ws.ok(&["dispatch", "--next", "--no-open"])?;
    assert!(out.contains("wa.me"), "stdout: {}", out);
    assert!(out.contains("marked as sent"), "stdout: {}", out);
    let out = ws.ok(&["dispatch", "--next", "--no-open"])?;
    assert!(out.contains("queue is empty"), "stdout: {}", out);

    ws.login("boss@example.com")?;
    ws.ok(&["export", "--base", "Promo", "--out", &export_arg])?;
    let rows = csv_rows(&export_path)?;
    let sent: Vec<&Vec<String>> = rows[1..].iter().filter(|r| r[2] == "SENT").collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][3], "ana");
    assert_ne!(sent[0][5], "Pending");

    let stats = ws.ok(&["stats"])?;
    assert!(stats.contains("50.0%"), "stdout: {}", stats);
    Ok(())
}

#[test]
fn sheet_import_and_agent_toggle() -> TestResult<()> {
    let ws = Workspace::new()?;
    ws.ok(&["install"])?;
    ws.login("solo@example.com")?;
    ws.login("admin@leadrelay.local")?;
    ws.ok(&["base", "create", "--name", "Sheet", "--copy", "Hello [NOME]"])?;

    let sheet = ws.path().join("leads.csv");
    std::fs::write(&sheet, "Telefone;Nome\n11999990000;Ana\n11888880001;Bia\n")?;
    let sheet_arg = sheet.to_string_lossy().into_owned();
    let out = ws.ok(&["import", "--base", "Sheet", "--file", &sheet_arg])?;
    assert!(out.contains("Imported 2 leads"), "stdout: {}", out);

    let headerless = ws.path().join("raw.csv");
    std::fs::write(&headerless, "Ana,Sheet,11999990000\n")?;
    let headerless_arg = headerless.to_string_lossy().into_owned();
    ws.fails(&["import", "--base", "Sheet", "--file", &headerless_arg])?;
    ws.ok(&[
        "import",
        "--base",
        "Sheet",
        "--file",
        &headerless_arg,
        "--legacy-layout",
    ])?;

    ws.ok(&["agent", "toggle", "solo@example.com"])?;
    let err = ws.fails(&["import", "--base", "Sheet", "--text", "Cy,11777770002"])?;
    assert!(err.contains("no active agents"), "stderr: {}", err);
    Ok(())
}
