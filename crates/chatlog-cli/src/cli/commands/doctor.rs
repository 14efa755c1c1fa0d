use super::{exit_codes, resolve_config};
use crate::cli::args::DoctorArgs;
use chatlog_core::doctor::{doctor, model::DoctorReport, DoctorOptions};

pub fn run(args: DoctorArgs) -> anyhow::Result<i32> {
    let (cfg, config_path) = resolve_config(&args.db, Some(&args.model))?;

    let opts = DoctorOptions {
        config_path,
        check_model: !args.no_model_check,
    };

    let report = doctor(&cfg, &opts)?;

    let rendered = if args.format == "json" {
        serde_json::to_string_pretty(&report)?
    } else {
        render_text(&report)
    };

    if let Some(p) = args.out {
        std::fs::write(&p, rendered)?;
        eprintln!("wrote file: {}", p.display());
    } else if args.format == "json" {
        println!("{}", rendered);
    } else {
        eprintln!("{}", rendered);
    }

    if report.has_errors() {
        Ok(exit_codes::CONFIG_ERROR)
    } else {
        Ok(exit_codes::OK)
    }
}

fn render_text(report: &DoctorReport) -> String {
    let mut s = String::new();
    s.push_str(&format!("Chatlog Doctor (v{})\n", report.chatlog_version));
    s.push_str(&format!("Database: {}\n", report.inputs.db_path));
    if let Some(db) = &report.db {
        let rows = |n: Option<u64>| n.map_or("-".to_string(), |n| n.to_string());
        s.push_str(&format!(
            "  answer: {} rows, message_replies: {}, sentiment: {}\n",
            rows(db.answer_rows),
            rows(db.message_replies_rows),
            rows(db.sentiment_rows)
        ));
    }
    if let Some(m) = &report.model {
        s.push_str(&format!("Model: {} ({})\n", m.name, m.provider));
    }
    if let Some(c) = &report.cache {
        s.push_str(&format!(
            "Cache: {} ({} entries)\n",
            c.path,
            c.entries.map_or("?".to_string(), |n| n.to_string())
        ));
    }

    s.push_str(&format!("Diagnostics: {}\n", report.diagnostics.len()));
    for d in &report.diagnostics {
        s.push_str(&format!("- [{}] {}\n", d.code, d.message));
    }

    if !report.suggested_actions.is_empty() {
        s.push_str("\nNext actions:\n");
        for a in &report.suggested_actions {
            s.push_str(&format!("- {}\n", a.title));
            for step in &a.steps {
                s.push_str(&format!("    {}\n", step));
            }
        }
    }
    s
}
