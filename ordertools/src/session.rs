//! The order form and the lifecycle of a single order: fill in the form, submit it, then track the order until it
//! settles, fails, or times out.
use std::{collections::BTreeMap, fmt::Display};

use anyhow::Result;
use log::*;
use order_engine::db_types::{NewOrder, OrderId};

use crate::reconciler::{OrderBackend, PollingPolicy, Reconciler, Ticker, TrackedStatus};

pub const DEFAULT_CURRENCY: &str = "KES";
pub const DEFAULT_TOKEN: &str = "USDC";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub amount: f64,
    pub currency: String,
    pub token: String,
    pub note: Option<String>,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self { amount: 0.0, currency: DEFAULT_CURRENCY.into(), token: DEFAULT_TOKEN.into(), note: None }
    }
}

impl OrderForm {
    pub fn new<S: Into<String>>(amount: f64, currency: S, token: S) -> Self {
        Self { amount, currency: currency.into(), token: token.into(), note: None }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Checks every field, and returns the order to submit if they are all valid.
    pub fn validate(&self) -> Result<NewOrder, FormErrors> {
        let mut errors = FormErrors::default();
        if self.amount.is_nan() || self.amount <= 0.0 {
            errors.insert("amount", "Amount must be greater than 0");
        }
        let currency = self.currency.trim();
        if currency.is_empty() {
            errors.insert("currency", "Currency is required");
        }
        let token = self.token.trim();
        if token.is_empty() {
            errors.insert("token", "Token is required");
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        let order = NewOrder::new(self.amount, currency, token);
        let order = match self.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(note) => order.with_note(note),
            None => order,
        };
        Ok(order)
    }
}

/// Validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    fn insert(&mut self, field: &'static str, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self.0.values().map(String::as_str).collect::<Vec<_>>();
        write!(f, "{}", messages.join(". "))
    }
}

//--------------------------------------     OrderSession      ---------------------------------------------------------
pub struct OrderSession<B> {
    backend: B,
    policy: PollingPolicy,
    form: OrderForm,
    errors: FormErrors,
    order_id: Option<OrderId>,
    status: Option<TrackedStatus>,
    finalized: bool,
}

impl<B: OrderBackend> OrderSession<B> {
    pub fn new(backend: B, policy: PollingPolicy) -> Self {
        Self {
            backend,
            policy,
            form: OrderForm::default(),
            errors: FormErrors::default(),
            order_id: None,
            status: None,
            finalized: false,
        }
    }

    pub fn with_form(mut self, form: OrderForm) -> Self {
        self.form = form;
        self
    }

    pub fn form(&self) -> &OrderForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut OrderForm {
        &mut self.form
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    pub fn status(&self) -> Option<TrackedStatus> {
        self.status
    }

    /// True while an order is outstanding and has not yet reached a final status.
    pub fn is_processing(&self) -> bool {
        !self.finalized && matches!(self.status, Some(TrackedStatus::Created | TrackedStatus::Processing))
    }

    /// Validates the form and submits it.
    ///
    /// Returns `Ok(None)` if the form is invalid; the reasons are then available from [`Self::errors`]. Submitting a new
    /// order forgets whatever the previous one ended as.
    pub async fn submit(&mut self) -> Result<Option<OrderId>> {
        let order = match self.form.validate() {
            Ok(order) => order,
            Err(errors) => {
                debug!("📝️ Order form is invalid. {errors}");
                self.errors = errors;
                return Ok(None);
            },
        };
        self.errors = FormErrors::default();
        self.order_id = None;
        self.status = None;
        self.finalized = false;
        let order = self.backend.create_order(&order).await?;
        info!("📝️ Order {} created for {} {} via {}", order.order_id, order.amount, order.currency, order.token);
        self.order_id = Some(order.order_id.clone());
        self.status = Some(TrackedStatus::Created);
        Ok(Some(order.order_id))
    }

    /// Tracks the submitted order until it reaches a terminal status, which is returned.
    pub async fn track<T, F>(&mut self, ticker: &mut T, mut on_change: F) -> Result<TrackedStatus>
    where
        T: Ticker,
        F: FnMut(TrackedStatus),
    {
        let order_id = self.order_id.clone().ok_or_else(|| anyhow::anyhow!("No order has been submitted yet"))?;
        if self.finalized {
            if let Some(status) = self.status {
                return Ok(status);
            }
        }
        let mut reconciler = Reconciler::new(&self.backend, order_id, self.policy);
        let status = reconciler
            .run(ticker, |s| {
                self.status = Some(s);
                on_change(s);
            })
            .await;
        self.status = Some(status);
        self.finalized = true;
        Ok(status)
    }

    /// Puts the form back to its defaults and forgets the current order, ready for a fresh order cycle.
    pub fn reset(&mut self) {
        self.form = OrderForm::default();
        self.errors = FormErrors::default();
        self.order_id = None;
        self.status = None;
        self.finalized = false;
    }
}
