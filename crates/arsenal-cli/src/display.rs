//! Plain-text rendering of sync results and progress summaries.

use arsenal_core::{
    Aggregate, Category, MasteryCounts, PlayerScore, Player, StarChartCounts, SyncSummary,
};

pub fn print_sync_summary(summary: &SyncSummary) {
    println!("Sync complete");
    println!("  {:<26} {}", "mastery records", summary.synced);
    println!("  {:<26} {}", "mastered", summary.mastered);
    println!("  {:<26} {}", "node completions", summary.nodes);
    if summary.skipped_items > 0 || summary.skipped_nodes > 0 {
        println!(
            "  {:<26} {} items, {} nodes",
            "not in catalog", summary.skipped_items, summary.skipped_nodes
        );
    }
}

pub fn print_player(player: &Player, score: &PlayerScore) {
    let name = player.display_name.as_deref().unwrap_or(&player.natural_id);
    println!("{name} ({})", player.platform);
    match player.last_sync {
        Some(at) => println!("  {:<26} {}", "last sync", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("  {:<26} never", "last sync"),
    }

    let level = &score.level;
    let label = if level.is_legendary() {
        format!("Legendary {}", level.level - 30)
    } else {
        level.level.to_string()
    };
    println!("  {:<26} {}", "mastery rank", label);
    println!(
        "  {:<26} {} / {} ({:.1}%)",
        "score", score.total, level.next_threshold, level.progress_percent
    );
    println!("  {:<26} {}", "  from items", score.item_score);
    println!("  {:<26} {}", "  from intrinsics", score.intrinsics_score);
    println!("  {:<26} {}", "  from star chart", score.exploration_score);
    println!();
}

pub fn print_mastery(agg: &Aggregate<MasteryCounts>) {
    println!("── Mastery by category ──");
    println!("  {:<26} {:>9} {:>9}", "", "mastered", "xp %");
    for group in &agg.groups {
        let label = group
            .key
            .parse::<Category>()
            .map(|c| c.label())
            .unwrap_or(group.key.as_str());
        print_mastery_row(label, &group.counters);
    }
    print_mastery_row("Total", &agg.total);
    println!();
}

fn print_mastery_row(label: &str, c: &MasteryCounts) {
    println!(
        "  {:<26} {:>9} {:>8.1}%",
        label,
        format!("{}/{}", c.mastered, c.total),
        percent(c.xp_earned, c.xp_total)
    );
}

pub fn print_star_chart(agg: &Aggregate<StarChartCounts>) {
    println!("── Star chart ──");
    println!("  {:<26} {:>9} {:>11}", "", "normal", "steel path");
    for group in &agg.groups {
        print_star_chart_row(&group.key, &group.counters);
    }
    print_star_chart_row("Total", &agg.total);
    println!();
}

fn print_star_chart_row(label: &str, c: &StarChartCounts) {
    println!(
        "  {:<26} {:>9} {:>11}",
        label,
        format!("{}/{}", c.completed, c.total),
        format!("{}/{}", c.steel_path_completed, c.total)
    );
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
