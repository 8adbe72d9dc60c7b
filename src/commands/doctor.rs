use crate::core::config::InstallerConfig;
use crate::core::patch::{ConfigInspection, ConfigPatcher};
use crate::error::{Result, SetupError};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub download_url: String,
    pub extract_dir: PathBuf,
    pub extract_dir_exists: bool,
    pub compiler_found: bool,
    pub dosbox: ConfigInspection,
}

impl DoctorReport {
    pub fn collect(config: &InstallerConfig) -> Result<Self> {
        let patcher = ConfigPatcher::new(config.dosbox_dir());
        let dosbox = patcher.inspect(&config.extract_dir)?;

        let bin_dir = config.extract_dir.join("TURBOC3").join("BIN");

        Ok(Self {
            download_url: config.download_url.clone(),
            extract_dir: config.extract_dir.clone(),
            extract_dir_exists: config.extract_dir.is_dir(),
            compiler_found: ["TC.EXE", "tc.exe"]
                .iter()
                .any(|name| bin_dir.join(name).is_file()),
            dosbox,
        })
    }

    pub fn issues(&self) -> usize {
        [
            self.extract_dir_exists,
            self.compiler_found,
            self.dosbox.dosbox_dir_exists,
            self.dosbox.config_file.is_some(),
            self.dosbox.stanza_applied,
        ]
        .iter()
        .filter(|ok| !**ok)
        .count()
    }
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

pub fn check_environment(format: &str) -> Result<()> {
    let config = InstallerConfig::load()?;
    let report = DoctorReport::collect(&config)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| SetupError::config_error(e.to_string()))?;
            println!("{json}");
        }
        "text" => print_report(&report),
        other => {
            return Err(SetupError::config_error(format!(
                "unknown output format '{other}' (expected text or json)"
            )))
        }
    }

    Ok(())
}

fn print_report(report: &DoctorReport) {
    println!("🔍 Turbo Setup - Environment Check");
    println!();

    println!("📁 Turbo C:");
    println!("  install directory: {}", report.extract_dir.display());
    println!("    {} exists", mark(report.extract_dir_exists));
    println!("    {} TURBOC3\\BIN\\TC.EXE present", mark(report.compiler_found));
    println!();

    println!("📦 DOSBox:");
    println!("  configuration directory: {}", report.dosbox.dosbox_dir.display());
    println!("    {} exists", mark(report.dosbox.dosbox_dir_exists));
    match &report.dosbox.config_file {
        Some(path) => println!("    ✅ config file: {}", path.display()),
        None => println!("    ❌ no dosbox*.conf found"),
    }
    println!(
        "    {} autoexec launches Turbo C",
        mark(report.dosbox.stanza_applied)
    );
    println!();

    let issues = report.issues();
    if issues == 0 {
        println!("✅ Everything is set up. Start DOSBox to launch Turbo C.");
    } else {
        println!("⚠️  {issues} issue(s) found.");
        if !report.dosbox.dosbox_dir_exists {
            println!("   Install DOSBox and start it once, then run 'turbo-setup install'.");
        } else {
            println!("   Run 'turbo-setup install' to fix them.");
        }
    }
}
