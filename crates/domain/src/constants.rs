//! Application constants
//!
//! Centralized location for domain-level constants shared by the services and
//! adapters.

// KSeF environments
pub const KSEF_TEST_BASE_URL: &str = "https://ksef-test.mf.gov.pl/api/v2";
pub const KSEF_PRODUCTION_BASE_URL: &str = "https://ksef.mf.gov.pl/api/v2";

// Credentials
pub const MIN_TOKEN_LENGTH: usize = 20;
pub const TOKEN_MASK_EDGE: usize = 10;
pub const NIP_LENGTH: usize = 10;
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "keys/ksef_public_key.pem";

// Submission bookkeeping
pub const MAX_PROCESSING_DESCRIPTION_CHARS: usize = 500;
pub const PROCESSING_CODE_SUCCESS: i64 = 315;
pub const PROCESSING_CODE_ERROR_FLOOR: i64 = 400;
pub const SENT_DESCRIPTION: &str = "sent successfully, awaiting UPO";

// Timeouts (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 15;

// Invoice defaults
pub const DEFAULT_ITEM_UNIT: &str = "szt.";
pub const DEFAULT_PAYMENT_METHOD: &str = "transfer";
pub const DEFAULT_PAYMENT_TERM_DAYS: i64 = 14;
pub const DEFAULT_CURRENCY: &str = "PLN";
pub const DEFAULT_SYSTEM_INFO: &str = "ksef-bridge";

// JPK_FA namespaces, newest first
pub const JPK_FA_4_NAMESPACE: &str = "http://jpk.mf.gov.pl/wzor/2022/02/17/02171/";
pub const JPK_FA_3_NAMESPACE: &str = "http://jpk.mf.gov.pl/wzor/2019/09/27/09271/";
pub const JPK_FA_2_NAMESPACE: &str = "http://jpk.mf.gov.pl/wzor/2016/03/09/03095/";

// FA(3) structured invoice
pub const FA3_NAMESPACE: &str = "http://crd.gov.pl/wzor/2023/06/29/12648/";
