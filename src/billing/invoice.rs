use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::order::{
    Order, OrderDetails, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub amount: f64,
}

/// Read-only billing view of an order snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub order_id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub partner_name: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: f64,
    pub charge_label: &'static str,
    pub charge: f64,
    pub quoted_total: f64,
    pub collected_total: f64,
    /// `collected_total - quoted_total`; zero until the order is finalized.
    pub adjustment: f64,
    pub finalized: bool,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    pub fn from_order(order: &Order) -> Self {
        let lines = match &order.details {
            OrderDetails::Shopping { items } => items
                .iter()
                .map(|item| InvoiceLine {
                    description: format!("{} ({})", item.name, item.unit),
                    quantity: item.quantity,
                    unit_price: item.price,
                    amount: item.line_total(),
                })
                .collect(),
            OrderDetails::Ride(ride) => {
                let fare = order.financials.items_total.unwrap_or(order.financials.total_amount);
                vec![InvoiceLine {
                    description: format!(
                        "Ride {} -> {} ({:.1} km)",
                        ride.pickup, ride.drop, ride.distance_km
                    ),
                    quantity: 1,
                    unit_price: fare,
                    amount: fare,
                }]
            }
            OrderDetails::Service(service) => {
                let price = order.financials.items_total.unwrap_or(order.financials.total_amount);
                vec![InvoiceLine {
                    description: format!("{} - {}", service.category_name, service.option_name),
                    quantity: 1,
                    unit_price: price,
                    amount: price,
                }]
            }
        };

        let charge_label = match order.order_type {
            OrderType::Shopping => "Delivery charge",
            OrderType::Ride => "Booking charge",
            OrderType::Service => "Visit charge",
        };

        let quoted_total = order.financials.total_amount;
        let collected_total = order.financials.collected_total();

        Self {
            order_id: order.id,
            order_type: order.order_type,
            status: order.status,
            customer_name: order.customer.user_name.clone(),
            customer_phone: order.customer.user_phone.clone(),
            partner_name: order.assignment.as_ref().map(|a| a.name.clone()),
            subtotal: order
                .financials
                .items_total
                .unwrap_or_else(|| lines.iter().map(|line| line.amount).sum()),
            lines,
            charge_label,
            charge: order.financials.delivery_charge.unwrap_or(0.0),
            quoted_total,
            collected_total,
            adjustment: collected_total - quoted_total,
            finalized: order.financials.final_amount.is_some(),
            payment_method: order.financials.payment_method,
            payment_status: order.financials.payment_status,
            issued_at: order.completed_at.unwrap_or(order.updated_at),
        }
    }
}

/// Turns a finalized (or in-flight) order snapshot into a presentable document.
pub trait InvoiceRenderer {
    type Output;

    fn render(&self, order: &Order) -> Self::Output;
}

/// Fixed-width plain-text receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInvoiceRenderer;

impl InvoiceRenderer for TextInvoiceRenderer {
    type Output = String;

    fn render(&self, order: &Order) -> String {
        let invoice = Invoice::from_order(order);
        let mut out = String::new();

        let _ = writeln!(out, "INVOICE {}", invoice.order_id);
        let _ = writeln!(out, "Date: {}", invoice.issued_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(
            out,
            "Customer: {} ({})",
            invoice.customer_name, invoice.customer_phone
        );
        if let Some(partner) = &invoice.partner_name {
            let _ = writeln!(out, "Partner: {partner}");
        }
        let _ = writeln!(out, "Status: {}", invoice.status);
        let _ = writeln!(out, "{}", "-".repeat(48));

        for line in &invoice.lines {
            let _ = writeln!(
                out,
                "{:<30} {:>3} x {:>8.2} = {:>9.2}",
                truncate(&line.description, 30),
                line.quantity,
                line.unit_price,
                line.amount
            );
        }

        let _ = writeln!(out, "{}", "-".repeat(48));
        let _ = writeln!(out, "{:<36} {:>11.2}", "Subtotal", invoice.subtotal);
        let _ = writeln!(out, "{:<36} {:>11.2}", invoice.charge_label, invoice.charge);
        let _ = writeln!(out, "{:<36} {:>11.2}", "Quoted total", invoice.quoted_total);
        if invoice.finalized {
            let _ = writeln!(out, "{:<36} {:>11.2}", "Collected", invoice.collected_total);
            if invoice.adjustment != 0.0 {
                let _ = writeln!(out, "{:<36} {:>+11.2}", "Adjustment", invoice.adjustment);
            }
        }
        let method = match invoice.payment_method {
            PaymentMethod::Cod => "Cash on delivery",
            PaymentMethod::Online => "Online",
        };
        let status = match invoice.payment_status {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        };
        let _ = writeln!(out, "Payment: {method} ({status})");

        out
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::engine::reconciliation::{FinalizeRequest, apply_finalize};
    use crate::engine::testing::{order_at, rider};

    #[test]
    fn unfinalized_invoice_collects_quote() {
        let order = order_at(OrderType::Shopping, OrderStatus::Preparing);

        let invoice = Invoice::from_order(&order);

        assert_eq!(invoice.lines.len(), 1);
        assert_eq!(invoice.lines[0].amount, 500.0);
        assert_eq!(invoice.quoted_total, 530.0);
        assert_eq!(invoice.collected_total, 530.0);
        assert_eq!(invoice.adjustment, 0.0);
        assert!(!invoice.finalized);
    }

    #[test]
    fn finalized_invoice_shows_adjustment() {
        let mut order = order_at(OrderType::Service, OrderStatus::InProgress);
        apply_finalize(
            &mut order,
            &FinalizeRequest {
                amount: 450.0,
                actor: rider(),
                note: None,
            },
            Utc::now(),
        )
        .unwrap();

        let invoice = Invoice::from_order(&order);
        let text = TextInvoiceRenderer.render(&order);

        assert_eq!(invoice.collected_total, 450.0);
        assert_eq!(invoice.adjustment, -80.0);
        assert_eq!(invoice.charge_label, "Visit charge");
        assert!(text.contains("Collected"));
        assert!(text.contains("-80.00"));
        assert!(text.contains("Plumbing - Tap repair"));
        assert!(text.contains("Payment: Cash on delivery (paid)"));
    }
}
