use vixie_sched::{Instant, Registry};

fn main() {
    let expr = "0 0 9 * * * 1-5"; // weekdays at 9:00 AM local
    println!("Schedule: {expr} (weekdays at 9:00 AM local)");
    println!();

    // 2025-02-17T12:00:00Z (a Monday)
    let now = Instant::new_unchecked(1_739_793_600, 0);
    println!("Reference instant (UTC): {now}");
    println!();

    println!("Next trigger at a few fixed UTC offsets:");
    println!("-----------------------------------------");

    for (label, minutes) in [
        ("UTC", 0),
        ("UTC+09:00 (JST-like)", 9 * 60),
        ("UTC-05:00 (EST-like)", -5 * 60),
        ("UTC+05:30 (IST-like)", 5 * 60 + 30),
    ] {
        print_next(label, expr, now, minutes);
    }

    println!();
    println!("Note: the offset shifts which broken-down local time each UTC instant");
    println!("maps to; it does not resolve IANA zones or apply DST rules (§1 Non-goals).");
}

fn print_next(label: &str, expr: &str, now: Instant, offset_minutes: i32) {
    let reg = Registry::new();
    if reg.add(expr, |_| {}).is_err() || reg.set_offset(offset_minutes).is_err() {
        println!("{label:<24} offset={offset_minutes:>5}  error");
        return;
    }

    match reg.next_trigger(now) {
        Some(next) => println!("{label:<24} offset={offset_minutes:>5}  next={next}"),
        None => println!("{label:<24} offset={offset_minutes:>5}  next=none"),
    }
}
