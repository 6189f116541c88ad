//! PackRank CLI: `packrank` command.
//!
//! Operator tool over a file store: award and spend points, inspect
//! balances, tiers, and achievements, replay evaluations, score answers,
//! and verify ledgers.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use packrank::time::micros_to_rfc3339;
use packrank::{
    ActivityEvent, EngineConfig, FileStore, ListOptions, PointSource, ReputationEngine,
    ScoreRequest, SortOrder, TierEta, TransactionKind, TransactionQuery, UserId, UserStats,
};

// ── Directory and input helpers ───────────────────────────────────────────────

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set; pass --data-dir")?;
    Ok(PathBuf::from(home).join(".packrank"))
}

/// Read JSON from a file, or from stdin when the path is `-`.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let mut text = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
    } else {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `vote`, `answer`, `custom:<label>`, and the other source tags.
fn parse_source(s: &str) -> Result<PointSource> {
    let source = match s {
        "vote" => PointSource::Vote,
        "answer" => PointSource::Answer,
        "best_answer" => PointSource::BestAnswer,
        "question" => PointSource::Question,
        "referral" => PointSource::Referral,
        "event_attendance" => PointSource::EventAttendance,
        "adjustment" => PointSource::Adjustment,
        other => match other.strip_prefix("custom:") {
            Some(label) if !label.is_empty() => PointSource::Custom {
                label: label.to_string(),
            },
            _ => return Err(anyhow!("unknown point source '{s}'")),
        },
    };
    Ok(source)
}

fn parse_kind(s: &str) -> Result<TransactionKind> {
    match s {
        "earn" => Ok(TransactionKind::Earn),
        "spend" => Ok(TransactionKind::Spend),
        _ => Err(anyhow!("unknown transaction kind '{s}' (earn or spend)")),
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// PackRank CLI: points, tiers, and achievements for a dog-owner community.
#[derive(Parser, Debug)]
#[command(
    name = "packrank",
    about = "PackRank CLI",
    version,
    long_about = "packrank: PackRank CLI\n\nInspect and replay community reputation state: points ledgers,\ntiers, achievements, and answer quality scores."
)]
struct Cli {
    /// Data directory of the file store
    #[arg(long, global = true, env = "PACKRANK_HOME")]
    data_dir: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "PACKRANK_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Award points to a user
    Award {
        user: String,
        amount: u64,
        /// Source tag (vote, answer, best_answer, question, referral,
        /// event_attendance, adjustment, or custom:<label>)
        #[arg(long, default_value = "adjustment")]
        source: String,
        #[arg(long, default_value = "Manual award")]
        description: String,
    },

    /// Spend points on a redeemable item
    Spend {
        user: String,
        amount: u64,
        /// Item being redeemed
        #[arg(long)]
        item: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Show a user's balance, level, and streak
    Balance { user: String },

    /// List a user's transactions
    History {
        user: String,
        /// Only earn or spend transactions
        #[arg(long)]
        kind: Option<String>,
        /// Only transactions with this source tag
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Oldest first instead of newest first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Show a user's tier, progress, and benefits
    Tier { user: String },

    /// List a user's achievements
    Achievements {
        user: String,
        /// Include locked achievements
        #[arg(long)]
        all: bool,
        /// With --all, include masked hidden achievements
        #[arg(long)]
        hidden: bool,
    },

    /// Run an achievement pass from a stats file (JSON, `-` for stdin)
    Evaluate {
        user: String,
        #[arg(long)]
        stats: PathBuf,
    },

    /// Record an activity event (JSON), then run an achievement pass
    Record {
        user: String,
        /// Event JSON, e.g. {"event":"question_asked"}
        #[arg(long)]
        event: String,
        /// Stats file (JSON); empty stats when omitted
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Score an answer from a request file (JSON, `-` for stdin)
    Score { request: PathBuf },

    /// Verify a user's ledger hash chain and snapshot
    VerifyLedger { user: String },

    /// List users with an account
    Users,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn open_engine(cli: &Cli) -> Result<ReputationEngine> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let store = FileStore::new(&dir)
        .with_context(|| format!("failed to open store at {}", dir.display()))?;
    log::debug!("using data directory {}", dir.display());
    Ok(ReputationEngine::new(Arc::new(store), config)?)
}

fn run(cli: Cli) -> Result<()> {
    // Scoring needs no store.
    if let Commands::Score { request } = &cli.command {
        return cmd_score(request, cli.json);
    }

    let engine = open_engine(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Award {
            user,
            amount,
            source,
            description,
        } => cmd_award(&engine, &user, amount, &source, &description, json),
        Commands::Spend {
            user,
            amount,
            item,
            description,
        } => cmd_spend(&engine, &user, amount, &item, description.as_deref(), json),
        Commands::Balance { user } => cmd_balance(&engine, &user, json),
        Commands::History {
            user,
            kind,
            source,
            limit,
            oldest_first,
        } => cmd_history(
            &engine,
            &user,
            kind.as_deref(),
            source,
            limit,
            oldest_first,
            json,
        ),
        Commands::Tier { user } => cmd_tier(&engine, &user, json),
        Commands::Achievements { user, all, hidden } => {
            cmd_achievements(&engine, &user, all, hidden, json)
        }
        Commands::Evaluate { user, stats } => cmd_evaluate(&engine, &user, &stats, json),
        Commands::Record { user, event, stats } => {
            cmd_record(&engine, &user, &event, stats.as_deref(), json)
        }
        Commands::VerifyLedger { user } => cmd_verify_ledger(&engine, &user, json),
        Commands::Users => cmd_users(&engine, json),
        Commands::Score { .. } => Ok(()),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `packrank award USER AMOUNT [--source TAG] [--description TEXT]`
fn cmd_award(
    engine: &ReputationEngine,
    user: &str,
    amount: u64,
    source: &str,
    description: &str,
    json: bool,
) -> Result<()> {
    let source = parse_source(source)?;
    let result = engine
        .award_points(&UserId::from(user), amount, source, description)
        .with_context(|| format!("failed to award {amount} points to {user}"))?;

    if json {
        return print_json(&result);
    }
    println!("Awarded {amount} points to {user}");
    println!("  Transaction: {}", result.transaction.id);
    println!("  Balance:     {}", result.account.balance);
    if let Some(up) = result.level_up {
        println!("  Level up:    {} -> {}", up.from, up.to);
    }
    if let Some(change) = result.tier_change {
        println!("  Tier:        {} -> {}", change.from, change.to);
    }
    Ok(())
}

/// `packrank spend USER AMOUNT --item ITEM`
fn cmd_spend(
    engine: &ReputationEngine,
    user: &str,
    amount: u64,
    item: &str,
    description: Option<&str>,
    json: bool,
) -> Result<()> {
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("Redeemed {item}"));
    let result = engine
        .spend_points(
            &UserId::from(user),
            amount,
            PointSource::Redemption {
                item: item.to_string(),
            },
            &description,
        )
        .with_context(|| format!("failed to spend {amount} points for {user}"))?;

    if json {
        return print_json(&result);
    }
    println!("Spent {amount} points for {user} on {item}");
    println!("  Transaction: {}", result.transaction.id);
    println!("  Balance:     {}", result.account.balance);
    Ok(())
}

/// `packrank balance USER`
fn cmd_balance(engine: &ReputationEngine, user: &str, json: bool) -> Result<()> {
    let account = engine.get_points_snapshot(&UserId::from(user))?;
    if json {
        return print_json(&account);
    }
    let level = account.level_info(engine.config().level_step);
    println!("Account: {user}");
    println!("  Balance:      {}", account.balance);
    println!("  Earned:       {}", account.earned_total);
    println!("  Spent:        {}", account.spent_total);
    println!(
        "  Level:        {} ({} / {} to next)",
        level.level,
        level.into_level,
        level.into_level + level.needed_for_next
    );
    println!("  Streak:       {} days", account.streak_count);
    println!("  Transactions: {}", account.transaction_count);
    Ok(())
}

/// `packrank history USER [--kind K] [--source TAG] [--limit N] [--oldest-first]`
fn cmd_history(
    engine: &ReputationEngine,
    user: &str,
    kind: Option<&str>,
    source: Option<String>,
    limit: usize,
    oldest_first: bool,
    json: bool,
) -> Result<()> {
    let mut query = TransactionQuery::new().limit(limit);
    if let Some(kind) = kind {
        query = query.kind(parse_kind(kind)?);
    }
    if let Some(source) = source {
        query = query.source(source);
    }
    if oldest_first {
        query = query.order(SortOrder::OldestFirst);
    }

    let transactions = engine.transaction_history(&UserId::from(user), &query)?;
    if json {
        return print_json(&transactions);
    }
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    for tx in &transactions {
        let sign = match tx.kind {
            TransactionKind::Earn => '+',
            TransactionKind::Spend => '-',
        };
        println!(
            "  #{:<5} {}  {}{:<6} {:<16} {}",
            tx.sequence,
            micros_to_rfc3339(tx.created_at),
            sign,
            tx.amount,
            tx.source.as_tag(),
            tx.description
        );
    }
    Ok(())
}

/// `packrank tier USER`
fn cmd_tier(engine: &ReputationEngine, user: &str, json: bool) -> Result<()> {
    let status = engine.get_tier_status(&UserId::from(user))?;
    if json {
        return print_json(&status);
    }
    println!("Tier: {}", status.state.current_tier);
    println!("  Tier points:    {}", status.state.tier_points);
    println!("  This month:     {}", status.state.monthly_tier_points);
    match status.next_tier {
        Some(next) => {
            println!("  Next tier:      {next} ({:.1}%)", status.progress_percentage);
            if let Some(remaining) = status.points_to_next_tier {
                println!("  Points needed:  {remaining}");
            }
        }
        None => println!("  Next tier:      none (top tier)"),
    }
    println!("  Daily average:  {:.1}", status.average_daily_points);
    let eta = match status.eta {
        TierEta::Days(days) => format!("{days} days"),
        TierEta::Unknown => "unknown".to_string(),
        TierEta::TopTier => "-".to_string(),
    };
    println!("  Estimated:      {eta}");
    println!("  Benefits:       {}", status.benefits.join(", "));
    Ok(())
}

/// `packrank achievements USER [--all] [--hidden]`
fn cmd_achievements(
    engine: &ReputationEngine,
    user: &str,
    all: bool,
    hidden: bool,
    json: bool,
) -> Result<()> {
    let listing = engine.list_achievements(
        &UserId::from(user),
        ListOptions {
            include_locked: all,
            include_hidden: hidden,
        },
    )?;
    if json {
        return print_json(&listing);
    }

    println!("Unlocked ({}):", listing.unlocked.len());
    for a in &listing.unlocked {
        let when = a.unlocked_at.map(micros_to_rfc3339).unwrap_or_default();
        let rarity = format!("{:?}", a.rarity).to_lowercase();
        println!("  {:<24} {:<10} {}", a.name, rarity, when);
    }
    if all {
        println!();
        println!("Locked ({}):", listing.locked_visible.len());
        for a in &listing.locked_visible {
            println!("  {:<24} {:>5.1}%  {}", a.name, a.progress_percentage, a.description);
        }
    }
    if !listing.hints.is_empty() {
        println!();
        println!("Hints:");
        for h in &listing.hints {
            println!("  {}", h.hint);
        }
    }
    Ok(())
}

fn print_outcome(outcome: &packrank::EvaluationOutcome) {
    if outcome.is_empty() {
        println!("Nothing new.");
        return;
    }
    for a in outcome.newly_unlocked.iter().chain(&outcome.discovered_hidden) {
        println!("  Unlocked {} (+{} points)", a.name, a.points_awarded);
    }
    for up in &outcome.level_ups {
        println!("  Level {} -> {}", up.from, up.to);
    }
    if let Some(change) = outcome.tier_change {
        println!("  Tier {} -> {}", change.from, change.to);
    }
}

/// `packrank evaluate USER --stats FILE`
fn cmd_evaluate(engine: &ReputationEngine, user: &str, stats: &Path, json: bool) -> Result<()> {
    let stats: UserStats = read_json(stats)?;
    let outcome = engine.evaluate_activity(&UserId::from(user), &stats);
    if json {
        return print_json(&outcome);
    }
    println!("Evaluation for {user}:");
    print_outcome(&outcome);
    Ok(())
}

/// `packrank record USER --event JSON [--stats FILE]`
fn cmd_record(
    engine: &ReputationEngine,
    user: &str,
    event: &str,
    stats: Option<&Path>,
    json: bool,
) -> Result<()> {
    let event: ActivityEvent = serde_json::from_str(event).context("invalid event JSON")?;
    let stats: UserStats = match stats {
        Some(path) => read_json(path)?,
        None => UserStats::default(),
    };
    let outcome = engine.record_activity(&UserId::from(user), &event, &stats)?;
    if json {
        return print_json(&outcome);
    }
    match &outcome.transaction {
        Some(result) => println!(
            "Recorded for {user}: +{} points (balance {})",
            result.transaction.amount, result.account.balance
        ),
        None => println!("Recorded for {user}: no points"),
    }
    print_outcome(&outcome.evaluation);
    Ok(())
}

/// `packrank score REQUEST`
fn cmd_score(request: &Path, json: bool) -> Result<()> {
    let request: ScoreRequest = read_json(request)?;
    let score = packrank::quality::score_request(&request);
    if json {
        return print_json(&score);
    }
    println!("Score: {:.3} ({})", score.overall_score, score.tier);
    println!("  Content:     {:.3}", score.factors.content_quality);
    println!("  Credibility: {:.3}", score.factors.expert_credibility);
    println!("  Engagement:  {:.3}", score.factors.community_engagement);
    println!("  Timeliness:  {:.3}", score.factors.timeliness);
    println!("  Complete:    {:.3}", score.factors.completeness);
    if score.is_fallback {
        println!("  (neutral fallback)");
    }
    for r in &score.recommendations {
        println!("  - {r}");
    }
    Ok(())
}

/// `packrank verify-ledger USER`
fn cmd_verify_ledger(engine: &ReputationEngine, user: &str, json: bool) -> Result<()> {
    let report = engine.verify_ledger(&UserId::from(user))?;
    if json {
        print_json(&report)?;
    } else {
        println!("Ledger: {user} ({} transactions)", report.transaction_count);
        println!("  Chain:    {}", if report.chain_valid { "VALID" } else { "INVALID" });
        println!(
            "  Snapshot: {}",
            if report.snapshot_matches { "MATCHES" } else { "STALE" }
        );
        for e in &report.errors {
            println!("  - {e}");
        }
        println!();
        println!("Result: {}", if report.is_valid { "VALID" } else { "INVALID" });
    }
    if !report.is_valid {
        return Err(anyhow!("ledger for {user} failed verification"));
    }
    Ok(())
}

/// `packrank users`
fn cmd_users(engine: &ReputationEngine, json: bool) -> Result<()> {
    let users = engine.users()?;
    if json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No users found.");
    }
    for user in &users {
        println!("  {user}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("vote").unwrap(), PointSource::Vote);
        assert_eq!(
            parse_source("custom:meetup").unwrap(),
            PointSource::Custom {
                label: "meetup".into()
            }
        );
        assert!(parse_source("custom:").is_err());
        assert!(parse_source("bogus").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("earn").unwrap(), TransactionKind::Earn);
        assert!(parse_kind("steal").is_err());
    }
}
