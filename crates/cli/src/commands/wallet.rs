//! Wallet operations: grant, remove, set, balance, top

use anyhow::Result;
use obol_ledger::{BalanceService, MutationService, TransactionResult};

use super::{truncate, Session};

pub async fn grant(
    session: &Session,
    namespace: &str,
    target: &str,
    amount: i64,
    reason: Option<&str>,
) -> Result<()> {
    let ns = session.namespace(namespace).await?;
    let result = MutationService::new(&session.ctx)
        .grant(&session.tenant, ns.id, &session.actor, target, amount, reason)
        .await?;
    print_result("Granted", &ns.name, target, &result);
    Ok(())
}

pub async fn remove(
    session: &Session,
    namespace: &str,
    target: &str,
    amount: i64,
    reason: Option<&str>,
) -> Result<()> {
    let ns = session.namespace(namespace).await?;
    let result = MutationService::new(&session.ctx)
        .remove(&session.tenant, ns.id, &session.actor, target, amount, reason)
        .await?;
    print_result("Removed", &ns.name, target, &result);
    Ok(())
}

pub async fn set(
    session: &Session,
    namespace: &str,
    target: &str,
    new_balance: i64,
    reason: Option<&str>,
) -> Result<()> {
    let ns = session.namespace(namespace).await?;
    let result = MutationService::new(&session.ctx)
        .set(&session.tenant, ns.id, &session.actor, target, new_balance, reason)
        .await?;
    print_result("Set", &ns.name, target, &result);
    Ok(())
}

/// One namespace, or every namespace the subject holds tokens in
pub async fn balance(session: &Session, subject: &str, namespace: Option<&str>) -> Result<()> {
    let balances = BalanceService::new(&session.ctx);

    if let Some(input) = namespace {
        let ns = session.namespace(input).await?;
        let balance = balances.get_balance(&session.tenant, ns.id, subject).await?;
        println!("💰 {} in {}: {}", subject, ns.name, balance);
        return Ok(());
    }

    let held = balances
        .list_balances_for_subject(&session.tenant, subject)
        .await?;
    if held.is_empty() {
        println!("{} holds no tokens.", subject);
        return Ok(());
    }

    println!("💰 Balances for {}", subject);
    println!("{:<6} {:<32} {:>12}", "ID", "NAMESPACE", "BALANCE");
    println!("{}", "-".repeat(52));
    for b in held {
        println!(
            "{:<6} {:<32} {:>12}",
            b.namespace_id,
            truncate(&b.namespace_name, 32),
            b.balance
        );
    }
    Ok(())
}

pub async fn top(session: &Session, namespace: &str, limit: u32) -> Result<()> {
    let ns = session.namespace(namespace).await?;
    let wallets = BalanceService::new(&session.ctx)
        .top_balances(&session.tenant, ns.id, limit)
        .await?;

    println!("🏆 Top balances in {}", ns.name);
    if wallets.is_empty() {
        println!("No wallets yet.");
        return Ok(());
    }
    println!("{:<4} {:<32} {:>12}", "#", "SUBJECT", "BALANCE");
    println!("{}", "-".repeat(50));
    for (rank, w) in wallets.iter().enumerate() {
        println!("{:<4} {:<32} {:>12}", rank + 1, truncate(&w.subject, 32), w.balance);
    }
    Ok(())
}

fn print_result(verb: &str, namespace: &str, target: &str, result: &TransactionResult) {
    println!("✅ {} successful!", verb);
    println!("   Transaction: {}", result.transaction_id);
    println!("   Namespace:   {}", namespace);
    println!("   Target:      {}", target);
    println!("   Balance:     {}", result.change);
}
