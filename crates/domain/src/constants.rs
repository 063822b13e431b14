//! Remote-service constants
//!
//! Centralized location for the ledger service's fixed limits, endpoints and
//! entity-type lists. These are immutable and injected into the core through
//! [`crate::EntityCatalog`] rather than looked up on a shared instance.

// Paging limits imposed by the server
pub const PAGE_SIZE_CEILING: u32 = 500;
pub const LEGACY_PAGE_SIZE: u32 = 30;

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;

// Endpoints
pub const DEFAULT_BASE_URL: &str = "https://quickbooks.api.intuit.com/v3";
pub const LEGACY_BASE_URL: &str = "https://qbo.intuit.com/qbo1";
pub const REQUEST_TOKEN_URL: &str = "https://oauth.intuit.com/oauth/v1/get_request_token";
pub const ACCESS_TOKEN_URL: &str = "https://oauth.intuit.com/oauth/v1/get_access_token";
pub const AUTHORIZE_URL: &str = "https://appcenter.intuit.com/Connect/Begin";

/// Filter applied to name-list queries so soft-deleted records are included.
pub const INCLUDE_INACTIVE_FILTER: &str = "WHERE Active IN (true,false)";

/// Entity type that never receives a default or inherited filter tail.
pub const UNFILTERED_ENTITY_TYPE: &str = "TimeActivity";

/// Properties accepted by parameterised `WHERE` clauses.
pub const FILTERABLE_PROPERTIES: &[&str] =
    &["TxnDate", "MetaData.CreateTime", "MetaData.LastUpdatedTime"];

/// Every entity type the service exposes.
pub const BUSINESS_OBJECTS: &[&str] = &[
    "Account",
    "Attachable",
    "Bill",
    "BillPayment",
    "Class",
    "CompanyInfo",
    "CreditMemo",
    "Customer",
    "Department",
    "Employee",
    "Estimate",
    "Invoice",
    "Item",
    "JournalEntry",
    "Payment",
    "PaymentMethod",
    "Preferences",
    "Purchase",
    "PurchaseOrder",
    "SalesReceipt",
    "TaxCode",
    "TaxRate",
    "Term",
    "TimeActivity",
    "Vendor",
    "VendorCredit",
];

/// Name-list entity types (soft-deletable reference data).
pub const NAME_LIST_OBJECTS: &[&str] = &[
    "Account",
    "Class",
    "Customer",
    "Department",
    "Employee",
    "Item",
    "PaymentMethod",
    "TaxCode",
    "TaxRate",
    "Term",
    "Vendor",
];

/// Transaction entity types.
pub const TRANSACTION_OBJECTS: &[&str] = &[
    "Bill",
    "BillPayment",
    "CreditMemo",
    "Estimate",
    "Invoice",
    "JournalEntry",
    "Payment",
    "Purchase",
    "PurchaseOrder",
    "SalesReceipt",
    "TimeActivity",
    "VendorCredit",
];
