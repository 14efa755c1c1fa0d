use crate::model::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    eprintln!("\nDatabase: {}", summary.db);

    for s in &summary.steps {
        eprintln!(
            "✅ {:<18} {:>8} rows  ({:.1}s)",
            s.table,
            s.rows,
            s.duration_ms as f64 / 1000.0
        );
    }

    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    match &summary.model {
        Some(model) if summary.predictions + summary.cache_hits > 0 => eprintln!(
            "Summary: {} steps, model {}: {} predictions, {} cache hits ({:.1}s)",
            summary.steps.len(),
            model,
            summary.predictions,
            summary.cache_hits,
            summary.duration_ms as f64 / 1000.0
        ),
        _ => eprintln!(
            "Summary: {} steps ({:.1}s)",
            summary.steps.len(),
            summary.duration_ms as f64 / 1000.0
        ),
    }
}
