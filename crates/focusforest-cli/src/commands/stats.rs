use chrono::Local;
use focusforest_core::{Persistence, Stats};

use super::open_store;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let stats = Stats::from_logs(&store.logs(), &Local::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Focus today:      {} min", stats.today_focus_minutes);
    println!("Total sessions:   {}", stats.total_sessions);
    println!("Total focus:      {} min", stats.total_focus_minutes);
    println!("Completion rate:  {}%", stats.completion_rate);
    println!("Average session:  {:.1} min", stats.average_minutes);
    println!("Best time of day: {}", stats.best_time_of_day.label());
    println!("Distractions:     {}", stats.total_distractions);

    if !stats.recent.is_empty() {
        println!();
        println!("Recent sessions:");
        for log in &stats.recent {
            let status = if log.completed { "done" } else { "abandoned" };
            let subject = if log.subject.is_empty() { "-" } else { &log.subject };
            println!(
                "  {}  {:<11} {:>3} min  {:<9} {}",
                log.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                log.mode.label(),
                log.duration_minutes,
                status,
                subject,
            );
        }
    }
    Ok(())
}
