//! In-memory payment data: services, favourites, accounts, bills and receipts.

use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};

use chrono::{Duration, Local, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{
    AccountInfo, BalanceInfo, BillInfo, PaymentResult, ReceiptInfo, ServiceInfo, DEFAULT_CURRENCY,
};

/// Mock bank and biller state behind the payment tools.
///
/// Balance updates take the account's own lock, so concurrent payments
/// against one account never lose an update while payments against
/// different accounts proceed independently. Once a payment holds its
/// account lock, the debit and its receipt are written without yielding,
/// so a cancelled payment has either fully happened or not at all.
#[derive(Debug)]
pub struct PaymentLedger {
    favorites: HashMap<String, Vec<String>>,
    services: HashMap<String, ServiceInfo>,
    accounts: HashMap<String, Arc<Mutex<AccountInfo>>>,
    latest_bills: HashMap<String, BillInfo>,
    receipts: std::sync::Mutex<HashMap<String, ReceiptInfo>>,
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::seeded()
    }
}

impl PaymentLedger {
    /// Ledger with the demo customers, services, accounts and bills.
    pub fn seeded() -> Self {
        let favorites = [
            ("cust-1", &["SVC001", "SVC002", "SVC004"][..]),
            ("cust-2", &["SVC003", "SVC005"][..]),
            ("cust-3", &["SVC001", "SVC003", "SVC004", "SVC005"][..]),
        ]
        .into_iter()
        .map(|(cust, ids)| (cust.to_string(), ids.iter().map(|id| id.to_string()).collect()))
        .collect();

        let services = [
            ("SVC001", "Luz del Sur", "Electricidad"),
            ("SVC002", "Sedapal", "Agua"),
            ("SVC003", "Claro Móvil", "Telefonía"),
            ("SVC004", "Netflix", "Streaming"),
            ("SVC005", "Movistar Hogar", "Internet"),
        ]
        .into_iter()
        .map(|(id, name, category)| {
            let info = ServiceInfo {
                id: id.into(),
                name: name.into(),
                category: category.into(),
            };
            (id.to_string(), info)
        })
        .collect();

        let accounts = [("acct-123", 20.50), ("acct-124", 250.00)]
            .into_iter()
            .map(|(id, balance)| {
                let account = AccountInfo {
                    id: id.into(),
                    balance,
                    currency: DEFAULT_CURRENCY.into(),
                };
                (id.to_string(), Arc::new(Mutex::new(account)))
            })
            .collect();

        let now = Local::now().naive_local();
        let latest_bills = [
            ("BILL-001", "cust-1", "SVC001", "Luz del Sur", 85.50, 15, "Noviembre 2025", "Pendiente"),
            ("BILL-002", "cust-1", "SVC002", "Sedapal", 42.30, 10, "Noviembre 2025", "Pendiente"),
            ("BILL-003", "cust-1", "SVC004", "Netflix", 44.90, 5, "Diciembre 2025", "Pendiente"),
            ("BILL-004", "cust-2", "SVC003", "Claro Móvil", 59.90, 8, "Diciembre 2025", "Pendiente"),
            ("BILL-005", "cust-2", "SVC005", "Movistar Hogar", 120.00, 20, "Diciembre 2025", "Pendiente"),
            ("BILL-006", "cust-3", "SVC001", "Luz del Sur", 150.75, -2, "Noviembre 2025", "Vencido"),
            ("BILL-007", "cust-3", "SVC003", "Claro Móvil", 39.90, 12, "Diciembre 2025", "Pendiente"),
        ]
        .into_iter()
        .map(|(bill_id, customer_id, service_id, service_name, amount, due_in_days, period, status)| {
            let bill = BillInfo {
                bill_id: bill_id.into(),
                customer_id: customer_id.into(),
                service_id: service_id.into(),
                service_name: service_name.into(),
                amount,
                currency: DEFAULT_CURRENCY.into(),
                due_date: (now + Duration::days(due_in_days))
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
                period: period.into(),
                status: status.into(),
                error_message: String::new(),
            };
            (bill_key(customer_id, service_id), bill)
        })
        .collect();

        Self {
            favorites,
            services,
            accounts,
            latest_bills,
            receipts: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// A customer's favourite services. Unknown customers have none.
    pub fn list_favorite_services(&self, customer_id: &str) -> Vec<ServiceInfo> {
        self.favorites
            .get(customer_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.services.get(id).cloned())
            .collect()
    }

    pub async fn get_balance(&self, account_id: &str) -> BalanceInfo {
        match self.accounts.get(account_id) {
            Some(account) => {
                let account = account.lock().await;
                BalanceInfo {
                    balance: account.balance,
                    currency: account.currency.clone(),
                    error_message: String::new(),
                }
            }
            None => BalanceInfo {
                balance: 0.0,
                currency: DEFAULT_CURRENCY.into(),
                error_message: format!("Account {account_id} not found."),
            },
        }
    }

    /// Debit `amount` from the account and record a receipt.
    ///
    /// Domain failures (unknown account or service, non-positive amount,
    /// insufficient funds) come back as a result with `error_message` set
    /// and leave the balance untouched.
    pub async fn pay_service(&self, account_id: &str, service_id: &str, amount: f64) -> PaymentResult {
        let Some(account) = self.accounts.get(account_id) else {
            return PaymentResult::failed(format!("Account {account_id} not found."));
        };
        if amount.is_nan() || amount <= 0.0 {
            return PaymentResult::failed("Amount must be greater than 0.");
        }

        let mut account = account.lock().await;
        if account.balance < amount {
            return PaymentResult::failed("Insufficient funds.");
        }
        let Some(service) = self.services.get(service_id) else {
            return PaymentResult::failed(format!("Service {service_id} not found."));
        };

        let receipt_id = new_receipt_id();
        let timestamp = Utc::now().naive_utc();
        let details = format!(
            "Pago de {amount:.2} {} a {} realizado exitosamente. Fecha: {}",
            account.currency,
            service.name,
            timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        let receipt = ReceiptInfo {
            receipt_id: receipt_id.clone(),
            account_id: account_id.into(),
            service_id: service_id.into(),
            service_name: service.name.clone(),
            amount,
            currency: account.currency.clone(),
            timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        };

        // No await from here until the account lock is released.
        self.receipts().insert(receipt_id.clone(), receipt);
        account.balance -= amount;
        let balance = account.balance;
        drop(account);

        tracing::debug!(account_id, service_id, amount, balance, receipt_id = %receipt_id, "payment recorded");

        PaymentResult {
            receipt_id,
            receipt_details: details,
            error_message: String::new(),
        }
    }

    pub fn get_latest_bill(&self, customer_id: &str, service_id: &str) -> BillInfo {
        if let Some(bill) = self.latest_bills.get(&bill_key(customer_id, service_id)) {
            return bill.clone();
        }
        match self.services.get(service_id) {
            None => BillInfo {
                error_message: format!("Servicio {service_id} no encontrado."),
                ..BillInfo::default()
            },
            Some(service) => BillInfo {
                service_id: service_id.into(),
                service_name: service.name.clone(),
                error_message: format!("No se encontró factura pendiente para {}.", service.name),
                ..BillInfo::default()
            },
        }
    }

    pub fn receipt(&self, receipt_id: &str) -> Option<ReceiptInfo> {
        self.receipts().get(receipt_id).cloned()
    }

    pub fn receipt_count(&self) -> usize {
        self.receipts().len()
    }

    fn receipts(&self) -> MutexGuard<'_, HashMap<String, ReceiptInfo>> {
        self.receipts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn bill_key(customer_id: &str, service_id: &str) -> String {
    format!("{customer_id}:{service_id}")
}

/// `RCP-` followed by 12 upper-case hex digits.
fn new_receipt_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("RCP-{}", hex[..12].to_uppercase())
}
