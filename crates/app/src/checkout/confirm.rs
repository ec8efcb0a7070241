//! Order confirmation

use std::io::{self, BufRead, Write};

use mockall::automock;

use tiffin::{checkout::CheckoutSnapshot, orders::OrderRequest};

/// Asks the customer whether to place an order.
#[automock]
pub trait Confirm: Send + Sync {
    /// Return `true` to place the order.
    fn confirm(&self, request: &OrderRequest, snapshot: &CheckoutSnapshot) -> bool;
}

/// Prompts on stdout and reads a yes/no answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, request: &OrderRequest, snapshot: &CheckoutSnapshot) -> bool {
        let mut stdout = io::stdout().lock();

        let prompt = writeln!(
            stdout,
            "Place order paying {} by {}? [y/N]",
            snapshot.total, request.payment_method
        )
        .and_then(|()| stdout.flush());

        if prompt.is_err() {
            return false;
        }

        let mut answer = String::new();

        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }

        is_yes(&answer)
    }
}

/// Accepts every order without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _request: &OrderRequest, _snapshot: &CheckoutSnapshot) -> bool {
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
