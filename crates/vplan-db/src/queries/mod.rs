pub mod holiday_plans;
