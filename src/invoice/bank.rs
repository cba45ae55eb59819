//! Bank account resolution for an order's invoice
//!
//! Priority: the account selected on the order, then an active temporary
//! account created for this order, then the shop's default account. If
//! none of them is active the invoice is rendered without payment details.

use crate::core::model::{BankAccount, Order, Shop};
use crate::core::service::BankAccountService;
use anyhow::Result;
use serde::Serialize;

/// Which priority level produced the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountSource {
    Selected,
    Temporary,
    ShopDefault,
}

/// The account an invoice shows, with where it came from
#[derive(Debug, Clone)]
pub struct ResolvedBankAccount {
    pub account: BankAccount,
    pub source: BankAccountSource,
}

impl ResolvedBankAccount {
    /// Name printed as payment recipient
    ///
    /// `use_anyname` swaps in the shop's company name. Routing is unaffected.
    pub fn recipient_name<'a>(&'a self, shop: &'a Shop) -> &'a str {
        if self.account.use_anyname {
            &shop.company_name
        } else {
            &self.account.account_holder
        }
    }
}

fn is_temporary_for(account: &BankAccount, order: &Order) -> bool {
    account.is_active && account.is_temporary && account.used_for_order_id == Some(order.id)
}

/// Resolve from already loaded rows
///
/// `accounts` may contain any rows; only the ones referenced by the order
/// or the shop, or tied to the order as temporary accounts, are considered.
pub fn resolve_from(
    order: &Order,
    shop: &Shop,
    accounts: &[BankAccount],
) -> Option<ResolvedBankAccount> {
    let active_by_id = |id: uuid::Uuid| accounts.iter().find(|a| a.id == id && a.is_active);

    if let Some(account) = order.selected_bank_account_id.and_then(active_by_id) {
        return Some(ResolvedBankAccount {
            account: account.clone(),
            source: BankAccountSource::Selected,
        });
    }

    if let Some(account) = accounts
        .iter()
        .filter(|a| is_temporary_for(a, order))
        .max_by_key(|a| a.created_at)
    {
        return Some(ResolvedBankAccount {
            account: account.clone(),
            source: BankAccountSource::Temporary,
        });
    }

    shop.bank_account_id
        .and_then(active_by_id)
        .map(|account| ResolvedBankAccount {
            account: account.clone(),
            source: BankAccountSource::ShopDefault,
        })
}

/// Resolve through the backend, stopping at the first match
pub async fn resolve_bank_account(
    order: &Order,
    shop: &Shop,
    accounts: &dyn BankAccountService,
) -> Result<Option<ResolvedBankAccount>> {
    if let Some(id) = order.selected_bank_account_id {
        match accounts.get(&id).await? {
            Some(account) if account.is_active => {
                tracing::debug!(order_id = %order.id, account_id = %id, "using selected bank account");
                return Ok(Some(ResolvedBankAccount {
                    account,
                    source: BankAccountSource::Selected,
                }));
            }
            _ => {
                tracing::debug!(order_id = %order.id, account_id = %id, "selected bank account missing or inactive");
            }
        }
    }

    let temporary = accounts
        .find_temporary_for_order(&order.id)
        .await?
        .into_iter()
        .filter(|a| is_temporary_for(a, order))
        .max_by_key(|a| a.created_at);
    if let Some(account) = temporary {
        tracing::debug!(order_id = %order.id, account_id = %account.id, "using temporary bank account");
        return Ok(Some(ResolvedBankAccount {
            account,
            source: BankAccountSource::Temporary,
        }));
    }

    if let Some(id) = shop.bank_account_id {
        if let Some(account) = accounts.get(&id).await?.filter(|a| a.is_active) {
            tracing::debug!(order_id = %order.id, account_id = %id, "using shop default bank account");
            return Ok(Some(ResolvedBankAccount {
                account,
                source: BankAccountSource::ShopDefault,
            }));
        }
    }

    tracing::debug!(order_id = %order.id, "no active bank account, invoice without payment details");
    Ok(None)
}
