//! The entry form for recording a transaction.

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner},
    lookup::{LookupItem, LookupKind},
};

use super::NewTransaction;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The raw form data for creating a transaction.
///
/// Every field arrives as text so that bad input is reported as a validation
/// alert instead of a rejected request.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    pub date: String,
    pub category: String,
    pub item: String,
    pub vendor: String,
    pub amount: String,
    pub from_account: String,
    pub paid_by: String,
}

fn required(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required.")));
    }

    Ok(value.to_owned())
}

impl TryFrom<TransactionForm> for NewTransaction {
    type Error = Error;

    fn try_from(form: TransactionForm) -> Result<Self, Self::Error> {
        let date = Date::parse(form.date.trim(), DATE_FORMAT).map_err(|_| {
            Error::Validation(format!("\"{}\" is not a valid date.", form.date.trim()))
        })?;

        let amount = form
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| {
                Error::Validation(format!("\"{}\" is not a valid amount.", form.amount.trim()))
            })?;

        Ok(NewTransaction {
            date,
            category: required("Category", &form.category)?,
            item: required("Item", &form.item)?,
            vendor: required("Vendor", &form.vendor)?,
            amount,
            from_account: required("Account", &form.from_account)?,
            paid_by: required("Paid by", &form.paid_by)?,
        })
    }
}

fn text_field(name: &str, label: &str, placeholder: &str, datalist: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for=(name)
                class=(FORM_LABEL_STYLE)
            {
                (label)
            }

            input
                name=(name)
                id=(name)
                type="text"
                placeholder=(placeholder)
                list=[datalist]
                required
                autocomplete="off"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn datalist(kind: LookupKind, items: &[LookupItem]) -> Markup {
    html! {
        datalist id=(kind.datalist_id())
        {
            @for item in items {
                option value=(item.name) {}
            }
        }
    }
}

/// The form for recording a new transaction.
///
/// `lookups` supplies the suggestions offered for the category, account and
/// payer fields.
pub fn transaction_form(today: Date, lookups: &[(LookupKind, Vec<LookupItem>)]) -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type=submit]"
            class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "Record Consumption" }

            div class="grid gap-4 md:grid-cols-2"
            {
                div
                {
                    label
                        for="date"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Date"
                    }

                    input
                        name="date"
                        id="date"
                        type="date"
                        value=(today)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount"
                    }

                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (text_field("item", "Item", "Coffee", None))
                (text_field("vendor", "Vendor", "Cafe", None))
                (text_field("category", "Category", "Food", Some(LookupKind::Category.datalist_id())))
                (text_field("from_account", "Account", "Checking", Some(LookupKind::Account.datalist_id())))
                (text_field("paid_by", "Paid By", "Name", Some(LookupKind::Payer.datalist_id())))
            }

            @for (kind, items) in lookups {
                (datalist(*kind, items))
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (spinner) }
                " Save"
            }
        }
    }
}
