use chrono::Utc;
use vixie_sched::{Instant, Registry};

fn main() {
    let title = "Common Schedule Patterns";
    println!("{title}");
    println!("{}", "-".repeat(title.len()));
    println!();

    let wall_clock = Utc::now();
    let now = Instant::new_unchecked(wall_clock.timestamp(), wall_clock.timestamp_subsec_nanos());
    println!("Current instant: {now}");
    println!();

    let patterns = vec![
        ("0 * * * * * *", "Every minute, on the second"),
        ("0 */5 * * * * *", "Every 5 minutes"),
        ("0 0 * * * * *", "Every hour"),
        ("0 0 0 * * * *", "Daily at midnight"),
        ("0 0 9 * * * 1-5", "Weekdays at 9:00 AM"),
        ("0 0 30 9 * * 1-5", "Weekdays at 9:30 AM"),
        ("0 0 0 1 * * *", "Monthly on the 1st at midnight"),
        ("500000000 * * * * * *", "Every second, at the half-second mark"),
        ("0,500000000 * * * * * *", "Twice a second"),
        ("0 0 0 0 1 * 5", "Day 1 of month, OR any Friday (vixie disjunction)"),
    ];

    for (pattern, description) in patterns {
        print_pattern(now, pattern, description);
    }
}

fn print_pattern(now: Instant, pattern: &str, description: &str) {
    let reg = Registry::new();
    match reg.add(pattern, |_| {}) {
        Ok(_) => match reg.next_trigger(now) {
            Some(next) => {
                println!("{description:<50} {pattern}");
                println!("  Next: {next}");
                println!();
            }
            None => {
                println!("{description:<50} {pattern}");
                println!("  Next: none within the search horizon");
                println!();
            }
        },
        Err(e) => {
            println!("{description:<50} {pattern}");
            println!("  Error: {e}");
            println!();
        }
    }
}
