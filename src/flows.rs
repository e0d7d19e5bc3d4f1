/// Prebuilt demonstration flows
///
/// Canned flows exercising the toolkit end to end, the way a component
/// catalog would: a linear company-setup wizard and a conditional order
/// flow with a skip-marked step and a simulated remote check.
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::form::FormStore;
use crate::remote::StubDirectory;
use crate::schema::{Rule, Schema};
use crate::wizard::StepDefinition;

/// A runnable showcase: schema, steps and default values.
pub struct DemoFlow {
    pub name: &'static str,
    pub schema: Schema,
    pub steps: Vec<StepDefinition>,
    pub defaults: Value,
}

impl DemoFlow {
    /// Store seeded with this flow's default values.
    pub fn build_store(&self) -> FormStore {
        FormStore::with_defaults(self.defaults.clone())
    }
}

/// Four linear, schema-validated steps: basics, contacts, departments
/// (a field array), workplace settings.
pub fn company_setup() -> AppResult<DemoFlow> {
    let business_types = vec![
        "corporation".to_string(),
        "llc".to_string(),
        "partnership".to_string(),
        "sole_proprietorship".to_string(),
    ];

    let schema = Schema::new()
        .field(
            "basic_info.company_name",
            [Rule::Required, Rule::MinLength(2), Rule::MaxLength(80)],
        )
        .field(
            "basic_info.business_type",
            [Rule::Required, Rule::OneOf(business_types)],
        )
        .field("basic_info.industry", [Rule::Required])
        .field(
            "basic_info.founded_year",
            [Rule::Required, Rule::Min(1800.0), Rule::Max(2100.0)],
        )
        .field("basic_info.employees", [Rule::Min(1.0)])
        .field("contact_info.headquarters.country", [Rule::Required])
        .field("contact_info.headquarters.city", [Rule::Required])
        .field(
            "contact_info.contact.email",
            [Rule::Required, Rule::Email],
        )
        .field(
            "contact_info.contact.phone",
            [
                Rule::Required,
                Rule::pattern(r"^[0-9+][0-9 -]{6,19}$", "Enter a valid phone number")?,
            ],
        )
        .field("departments", [Rule::MinItems(1), Rule::MaxItems(10)])
        .field(
            "settings.working_hours.start_time",
            [
                Rule::Required,
                Rule::pattern(r"^\d{2}:\d{2}$", "Use HH:MM for working hours")?,
            ],
        )
        .field(
            "settings.working_hours.end_time",
            [
                Rule::Required,
                Rule::pattern(r"^\d{2}:\d{2}$", "Use HH:MM for working hours")?,
            ],
        )
        .field("settings.working_hours.working_days", [Rule::MinItems(1)]);

    let steps = vec![
        StepDefinition::new("basic", "Basic Info")
            .with_description("Tell us about the company.")
            .validate(schema.step_validator(&["basic_info"])),
        StepDefinition::new("contact", "Contact Info")
            .with_description("Headquarters address and primary contact.")
            .validate(schema.step_validator(&["contact_info"])),
        StepDefinition::new("departments", "Departments")
            .with_description("Add at least one department.")
            .with_content("Departments can be reordered and removed before finishing.")
            .validate(schema.step_validator(&["departments"])),
        StepDefinition::new("settings", "Workplace Settings")
            .with_description("Working hours and policies.")
            .validate(schema.step_validator(&["settings"])),
    ];

    let defaults = json!({
        "basic_info": {
            "company_name": "",
            "business_type": "corporation",
            "industry": "",
            "founded_year": 2020,
            "employees": 1,
        },
        "contact_info": {
            "headquarters": { "country": "", "city": "" },
            "contact": { "email": "", "phone": "" },
        },
        "departments": [],
        "settings": {
            "working_hours": {
                "start_time": "09:00",
                "end_time": "18:00",
                "working_days": [],
            },
        },
    });

    Ok(DemoFlow {
        name: "company-setup",
        schema,
        steps,
        defaults,
    })
}

/// Customer-type driven flow: the business-details step is skip-marked
/// for anyone who is not a business customer, and the account step runs
/// a simulated remote email check.
pub fn conditional_order(directory: &StubDirectory) -> AppResult<DemoFlow> {
    let customer_types = vec![
        "individual".to_string(),
        "business".to_string(),
        "government".to_string(),
    ];

    let schema = Schema::new()
        .field("customer_type", [Rule::Required, Rule::OneOf(customer_types)])
        .field("customer_info.name", [Rule::Required])
        .field("customer_info.email", [Rule::Required, Rule::Email])
        .refine(
            "business_info.company_name",
            "Company name is required for business customers",
            |snapshot| {
                snapshot.str_at("customer_type") != Some("business")
                    || !snapshot.is_blank("business_info.company_name")
            },
        )
        .refine(
            "business_info.business_number",
            "Business number is required for business customers",
            |snapshot| {
                snapshot.str_at("customer_type") != Some("business")
                    || !snapshot.is_blank("business_info.business_number")
            },
        )
        .refine(
            "agreements.terms_of_service",
            "You must accept the terms of service",
            |snapshot| snapshot.bool_at("agreements.terms_of_service") == Some(true),
        );

    let steps = vec![
        StepDefinition::new("customer", "Customer")
            .with_description("Who is ordering?")
            .validate(schema.step_validator(&["customer_type", "customer_info"])),
        StepDefinition::new("business", "Business Details")
            .with_description("Registration details for invoicing.")
            .skip_if(|snapshot| snapshot.str_at("customer_type") != Some("business"))
            .validate(schema.step_validator(&["business_info"])),
        StepDefinition::new("account", "Account Check")
            .with_description("We verify the email is not already registered.")
            .validate_deferred(directory.email_unregistered("customer_info.email")),
        StepDefinition::new("agreements", "Agreements")
            .validate(schema.step_validator(&["agreements"])),
    ];

    let defaults = json!({
        "customer_type": "individual",
        "customer_info": { "name": "", "email": "" },
        "business_info": { "company_name": "", "business_number": "" },
        "agreements": { "terms_of_service": false },
    });

    Ok(DemoFlow {
        name: "conditional-order",
        schema,
        steps,
        defaults,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardFlow;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_company_setup_shape() {
        let demo = company_setup().unwrap();
        assert_eq!(demo.name, "company-setup");
        assert_eq!(demo.steps.len(), 4);
        assert!(demo.steps.iter().all(StepDefinition::has_validator));
    }

    #[test]
    fn test_company_setup_walkthrough() {
        let demo = company_setup().unwrap();
        let store = demo.build_store();
        let mut flow = WizardFlow::new(demo.steps, store.snapshot()).unwrap();
        flow.attach(store.bus());

        assert!(!flow.can_advance(), "defaults leave the first step invalid");

        store.set("basic_info.company_name", json!("Acme Rockets")).unwrap();
        store.set("basic_info.industry", json!("aerospace")).unwrap();
        flow.pump();
        assert!(flow.advance());

        store.set("contact_info.headquarters.country", json!("NO")).unwrap();
        store.set("contact_info.headquarters.city", json!("Oslo")).unwrap();
        store.set("contact_info.contact.email", json!("ops@acme.test")).unwrap();
        store.set("contact_info.contact.phone", json!("+47 555 01 234")).unwrap();
        flow.pump();
        assert!(flow.advance());

        store.push("departments", json!({ "name": "Engineering" })).unwrap();
        flow.pump();
        assert!(flow.advance());

        store.push("settings.working_hours.working_days", json!("monday")).unwrap();
        flow.pump();
        assert!(flow.advance());
        assert!(flow.is_complete());
    }

    #[test]
    fn test_conditional_order_skips_business_step_for_individuals() {
        let directory = StubDirectory::new(Duration::ZERO, Duration::ZERO);
        let demo = conditional_order(&directory).unwrap();
        let store = demo.build_store();
        let mut flow = WizardFlow::new(demo.steps, store.snapshot()).unwrap();
        flow.attach(store.bus());

        assert_eq!(flow.navigable_indices(), vec![0, 2, 3]);

        store.set("customer_type", json!("business")).unwrap();
        flow.pump();
        assert_eq!(flow.navigable_indices(), vec![0, 1, 2, 3]);
    }
}
