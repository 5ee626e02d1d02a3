//! Audit commands: one page, or an interactive pager

use anyhow::Result;
use chrono::Utc;
use obol_core::{AuditFilter, Page, PageRequest, Transaction, TxAction};
use obol_ledger::AuditService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::{truncate, Session};
use crate::pager::{Nav, PagerState, PagerStates};

/// Audit options as given on the command line
pub struct AuditQuery {
    pub namespace: Option<String>,
    pub target: Option<String>,
    pub action: Option<TxAction>,
    pub limit: u32,
    pub before: Option<i64>,
    pub after: Option<i64>,
}

impl AuditQuery {
    fn request(&self) -> PageRequest {
        match (self.before, self.after) {
            (Some(before_id), _) => PageRequest::older(self.limit, before_id),
            (None, Some(after_id)) => PageRequest::newer(self.limit, after_id),
            (None, None) => PageRequest::first(self.limit),
        }
    }
}

/// Print a single page with the cursors to continue from
pub async fn show_page(session: &Session, query: AuditQuery) -> Result<()> {
    let (filter, scope) = build_filter(session, &query).await?;
    let request = query.request();

    let page = AuditService::new(&session.ctx)
        .list_transactions_paged(&filter, &request)
        .await?;
    render(&page, &scope, &query);

    if page.has_next {
        if let Some(before_id) = page.cursor.before_id {
            println!("   Older: add --before {}", before_id);
        }
    }
    if page.has_prev {
        if let Some(after_id) = page.cursor.after_id {
            println!("   Newer: add --after {}", after_id);
        }
    }
    Ok(())
}

/// Interactive pager: n = older, p = newer, r = refresh, q = quit
pub async fn browse(session: &Session, query: AuditQuery) -> Result<()> {
    let (filter, scope) = build_filter(session, &query).await?;
    let audit = AuditService::new(&session.ctx);
    let mut states = PagerStates::default();

    let mut state = PagerState::new(filter, query.limit);
    let page = audit
        .list_transactions_paged(&state.filter, &query.request())
        .await?;
    state.record(&page);
    render(&page, &scope, &query);
    let token = states.put(state, Utc::now());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(b"[n]ext (older)  [p]rev (newer)  [r]efresh  [q]uit > ")
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "q" | "quit") {
            break;
        }
        let Some(nav) = Nav::parse(&line) else {
            println!("Unknown command '{}'", line.trim());
            continue;
        };

        let now = Utc::now();
        let swept = states.sweep(now);
        if swept > 0 {
            debug!(swept, live = states.len(), "expired pager sessions dropped");
        }

        let Some(mut state) = states.get(&token, now).cloned() else {
            println!("This view expired. Run 'obol audit --browse' again.");
            return Ok(());
        };
        let Some(request) = state.request(nav) else {
            println!("No more pages that way.");
            continue;
        };

        let page = audit.list_transactions_paged(&state.filter, &request).await?;
        state.record(&page);
        render(&page, &scope, &query);
        states.update(&token, state, now);
    }

    states.remove(&token);
    Ok(())
}

async fn build_filter(session: &Session, query: &AuditQuery) -> Result<(AuditFilter, String)> {
    let mut filter = AuditFilter::tenant(&session.tenant);
    let mut scope = "All namespaces".to_string();

    if let Some(input) = &query.namespace {
        let ns = session.namespace(input).await?;
        filter = filter.namespace(ns.id);
        scope = ns.name;
    }
    if let Some(target) = &query.target {
        filter = filter.target(target);
    }
    if let Some(action) = query.action {
        filter = filter.action(action);
    }
    Ok((filter, scope))
}

fn render(page: &Page<Transaction>, scope: &str, query: &AuditQuery) {
    println!();
    println!("🔍 Audit - {}", scope);
    if let Some(target) = &query.target {
        println!("   Target: {}", target);
    }
    if let Some(action) = query.action {
        println!("   Action: {}", action);
    }
    println!();

    if page.is_empty() {
        println!("No transactions found.");
    } else {
        println!(
            "{:<8} {:<17} {:<5} {:<14} {:<14} {:<7} {:>8} {:<20} {:<20}",
            "ID", "TIME (UTC)", "NS", "ACTOR", "TARGET", "ACTION", "AMOUNT", "BALANCE", "REASON"
        );
        println!("{}", "-".repeat(120));
        for tx in &page.items {
            println!(
                "{:<8} {:<17} {:<5} {:<14} {:<14} {:<7} {:>8} {:<20} {:<20}",
                tx.id,
                tx.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                tx.namespace_id,
                truncate(&tx.actor_subject, 14),
                truncate(&tx.target_subject, 14),
                tx.action.as_str(),
                tx.amount,
                tx.change().to_string(),
                truncate(tx.reason.as_deref().unwrap_or("-"), 20)
            );
        }
    }

    let marker = |on: bool| if on { "yes" } else { "no" };
    println!(
        "\n   {} per page | newer: {} | older: {}",
        query.limit.clamp(1, obol_core::MAX_PAGE_LIMIT),
        marker(page.has_prev),
        marker(page.has_next)
    );
}
