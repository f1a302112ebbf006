use ksef_core::CompanyDetails;
use ksef_domain::Result;

use crate::context::AppContext;

pub fn set(
    ctx: &AppContext,
    tenant: &str,
    company_name: String,
    tax_id: String,
    street: String,
    zip_code: String,
    city: String,
) -> Result<Vec<String>> {
    let details = CompanyDetails { company_name, tax_id, street, zip_code, city };
    let credential = ctx.credentials.update_company(tenant, &details)?;

    Ok(vec![
        format!("Company profile saved for tenant '{tenant}'."),
        format!("Name: {}", credential.company_name),
        format!("NIP: {}", credential.tax_id.unwrap_or_default()),
        format!("Address: {}, {} {}", credential.street, credential.zip_code, credential.city),
    ])
}
