//! Integration tests for the mask execution engine.
//!
//! These tests verify that:
//! - values without rules come back unchanged
//! - rules rewrite exactly the members they match, including nested records
//! - deep copies leave the original graph untouched, cycles included
//! - failures name the member that could not be masked

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use sanitize::{
    Asterisk, CopyPolicy, Email, Full, MaskFailure, Masker, Pii, Rule, RuleRegistry, Sanitize,
    SanitizeError, SanitizeExt, Token, TypeKey, mask, mask_deep_copy, strategy_of,
};

#[derive(Clone, Debug, PartialEq, Sanitize)]
struct Address {
    street: String,
    city: String,
}

#[derive(Clone, Debug, PartialEq, Sanitize)]
struct Customer {
    id: u64,
    #[mask(Pii)]
    name: String,
    #[mask(Email)]
    email: String,
    address: Address,
}

fn customer() -> Customer {
    Customer {
        id: 42,
        name: "John Doe".into(),
        email: "john.doe@example.com".into(),
        address: Address {
            street: "1 Main Street".into(),
            city: "Springfield".into(),
        },
    }
}

mod no_rules {
    use super::*;

    #[test]
    fn a_value_without_rules_is_unchanged() {
        let mut address = Address {
            street: "1 Main Street".into(),
            city: "Springfield".into(),
        };
        let before = address.clone();
        mask(&mut address).unwrap();
        assert_eq!(address, before);
    }

    #[test]
    fn shared_cells_without_rules_keep_their_identity() {
        #[derive(Clone, Debug, PartialEq, Sanitize)]
        struct Holder {
            shared: Rc<RefCell<Address>>,
        }

        let shared = Rc::new(RefCell::new(Address {
            street: "2 Side Road".into(),
            city: "Shelbyville".into(),
        }));
        let mut holder = Holder {
            shared: Rc::clone(&shared),
        };
        mask(&mut holder).unwrap();
        assert!(Rc::ptr_eq(&holder.shared, &shared));
        assert_eq!(shared.borrow().city, "Shelbyville");
    }
}

mod declared_rules {
    use super::*;

    #[test]
    fn only_matched_members_are_rewritten() {
        let original = customer();
        let mut masked = original.clone();
        mask(&mut masked).unwrap();

        assert_eq!(masked.name, "******oe");
        assert_eq!(masked.email, "jo******@example.com");
        assert_eq!(masked.id, original.id);
        assert_eq!(masked.address, original.address);
    }

    #[test]
    fn nested_records_apply_their_own_rules() {
        #[derive(Clone, Debug, Sanitize)]
        struct Order {
            reference: String,
            customer: Customer,
            items: Vec<Customer>,
        }

        let mut order = Order {
            reference: "ORD-1".into(),
            customer: customer(),
            items: vec![customer(), customer()],
        };
        mask(&mut order).unwrap();

        assert_eq!(order.reference, "ORD-1");
        assert_eq!(order.customer.name, "******oe");
        assert!(order.items.iter().all(|item| item.name == "******oe"));
    }

    #[test]
    fn container_patterns_cover_every_matching_member() {
        #[derive(Clone, Debug, Sanitize)]
        #[mask(Asterisk, patterns("^pass.*", "token"))]
        struct Credentials {
            user: String,
            password_hash: String,
            api_token: String,
        }

        let mut credentials = Credentials {
            user: "ada".into(),
            password_hash: "5f4dcc3b".into(),
            api_token: "sk_live_1234".into(),
        };
        mask(&mut credentials).unwrap();

        assert_eq!(credentials.user, "ada");
        assert_eq!(credentials.password_hash, "******");
        assert_eq!(credentials.api_token, "******");
    }

    #[test]
    fn tuple_members_are_named_by_index() {
        #[derive(Clone, Debug, Sanitize)]
        struct Pair(String, #[mask(Token)] String);

        let mut pair = Pair("visible".into(), "sk_live_abcdef".into());
        mask(&mut pair).unwrap();
        assert_eq!(pair.0, "visible");
        assert_eq!(pair.1, "**********cdef");
    }

    #[test]
    fn enum_variants_are_masked_by_member_name() {
        #[derive(Clone, Debug, PartialEq, Sanitize)]
        enum Credential {
            Password {
                user: String,
                #[mask(Full)]
                secret: String,
            },
            ApiKey(#[mask(Token)] String),
            Anonymous,
        }

        let mut password = Credential::Password {
            user: "ada".into(),
            secret: "hunter2".into(),
        };
        mask(&mut password).unwrap();
        assert_eq!(
            password,
            Credential::Password {
                user: "ada".into(),
                secret: "[REDACTED]".into(),
            }
        );

        let mut key = Credential::ApiKey("sk_live_abcdef".into());
        mask(&mut key).unwrap();
        assert_eq!(key, Credential::ApiKey("**********cdef".into()));

        let mut anonymous = Credential::Anonymous;
        mask(&mut anonymous).unwrap();
        assert_eq!(anonymous, Credential::Anonymous);
    }

    #[test]
    fn skipped_members_are_invisible() {
        #[derive(Clone, Debug)]
        struct Opaque(String);

        #[derive(Clone, Debug, Sanitize)]
        #[mask(Asterisk, patterns("secret"))]
        struct Wrapper {
            #[inspect(skip)]
            secret: Opaque,
            other_secret: String,
        }

        let mut wrapper = Wrapper {
            secret: Opaque("kept".into()),
            other_secret: "gone".into(),
        };
        mask(&mut wrapper).unwrap();
        assert_eq!(wrapper.secret.0, "kept");
        assert_eq!(wrapper.other_secret, "******");
    }

    #[test]
    fn scalars_reset_to_neutral_values() {
        #[derive(Clone, Debug, Sanitize)]
        struct Balance {
            #[mask(Full)]
            amount: u64,
            #[mask(Full)]
            verified: bool,
            #[mask(Full)]
            note: Option<String>,
        }

        let mut balance = Balance {
            amount: 1_000,
            verified: true,
            note: None,
        };
        mask(&mut balance).unwrap();
        assert_eq!(balance.amount, 0);
        assert!(!balance.verified);
        assert_eq!(balance.note, None);
    }
}

mod deep_copy {
    use super::*;

    #[test]
    fn the_original_is_never_mutated() {
        let original = customer();
        let copy = mask_deep_copy(&original).unwrap();
        assert_eq!(copy.name, "******oe");
        assert_eq!(original, customer());
    }

    #[test]
    fn masked_is_the_extension_form() {
        let original = customer();
        let copy = original.masked().unwrap();
        assert_eq!(copy.email, "jo******@example.com");
        assert_eq!(original.email, "john.doe@example.com");
    }

    #[derive(Clone, Debug, Sanitize)]
    struct Profile {
        #[mask(Asterisk)]
        secret: String,
        friend: Option<Rc<RefCell<Profile>>>,
    }

    #[test]
    fn shared_cells_are_copied_not_rewritten() {
        let shared = Rc::new(RefCell::new(Profile {
            secret: "s3cret".into(),
            friend: None,
        }));
        let holder = vec![Rc::clone(&shared), Rc::clone(&shared)];

        let copy = mask_deep_copy(&holder).unwrap();
        assert_eq!(shared.borrow().secret, "s3cret");
        assert_eq!(copy[0].borrow().secret, "******");
        assert!(!Rc::ptr_eq(&copy[0], &shared));
        assert!(Rc::ptr_eq(&copy[0], &copy[1]));
    }

    #[test]
    fn cyclic_graphs_keep_their_shape() {
        let first = Rc::new(RefCell::new(Profile {
            secret: "first".into(),
            friend: None,
        }));
        let second = Rc::new(RefCell::new(Profile {
            secret: "second".into(),
            friend: Some(Rc::clone(&first)),
        }));
        first.borrow_mut().friend = Some(Rc::clone(&second));

        let copy = mask_deep_copy(&first).unwrap();
        let copied_second = copy.borrow().friend.clone().unwrap();
        let back = copied_second.borrow().friend.clone().unwrap();

        assert_eq!(copy.borrow().secret, "******");
        assert_eq!(copied_second.borrow().secret, "******");
        assert!(Rc::ptr_eq(&back, &copy));
        assert_eq!(first.borrow().secret, "first");
        assert_eq!(second.borrow().secret, "second");

        first.borrow_mut().friend = None;
        copy.borrow_mut().friend = None;
    }

    #[test]
    fn identity_policy_is_visible_to_every_holder() {
        let shared = Rc::new(RefCell::new(Profile {
            secret: "s3cret".into(),
            friend: None,
        }));
        let mut holder = vec![Rc::clone(&shared)];
        mask(&mut holder).unwrap();
        assert_eq!(shared.borrow().secret, "******");
    }
}

mod scoped_registries {
    use super::*;

    #[derive(Clone, Debug, Sanitize)]
    struct Settings {
        name: String,
        values: BTreeMap<String, String>,
    }

    fn settings() -> Settings {
        let mut values = BTreeMap::new();
        values.insert("password".to_string(), "hunter2".to_string());
        values.insert("region".to_string(), "eu-west-1".to_string());
        Settings {
            name: "prod".into(),
            values,
        }
    }

    #[test]
    fn map_rules_apply_to_every_map() {
        let registry = RuleRegistry::new();
        registry.register_rule(
            TypeKey::map(),
            Rule::simple("password", strategy_of::<Asterisk>()).unwrap(),
        );
        let mut settings = settings();
        Masker::new(&registry).mask(&mut settings).unwrap();
        assert_eq!(settings.values["password"], "******");
        assert_eq!(settings.values["region"], "eu-west-1");
        assert_eq!(settings.name, "prod");
    }

    #[test]
    fn member_keys_select_map_entries() {
        let registry = RuleRegistry::new();
        registry.register_rule(
            TypeKey::of::<Settings>(),
            Rule::new("values", ["password"], strategy_of::<Asterisk>()).unwrap(),
        );
        let mut settings = settings();
        Masker::new(&registry).mask(&mut settings).unwrap();
        assert_eq!(settings.values["password"], "******");
        assert_eq!(settings.values["region"], "eu-west-1");
    }

    #[test]
    fn deep_copy_policy_through_a_scoped_masker() {
        let registry = RuleRegistry::new();
        registry.register_rule(
            TypeKey::of::<Settings>(),
            Rule::simple("name", strategy_of::<Full>()).unwrap(),
        );
        let original = settings();
        let masker = Masker::new(&registry).with_policy(CopyPolicy::DeepCopy);
        let copy = masker.mask_copy(&original).unwrap();
        assert_eq!(copy.name, "[REDACTED]");
        assert_eq!(original.name, "prod");
    }
}

mod failures {
    use super::*;

    #[derive(Clone, Debug, Sanitize)]
    struct Team {
        lead: Address,
    }

    #[test]
    fn a_rule_on_a_record_member_fails_loudly() {
        let registry = RuleRegistry::new();
        registry.register_rule(
            TypeKey::of::<Team>(),
            Rule::simple("lead", strategy_of::<Asterisk>()).unwrap(),
        );
        let mut team = Team {
            lead: Address {
                street: "1 Main Street".into(),
                city: "Springfield".into(),
            },
        };
        let err = Masker::new(&registry).mask(&mut team).unwrap_err();
        match err {
            SanitizeError::Masking(MaskFailure::Member { owner, member, .. }) => {
                assert_eq!(owner, "Team");
                assert_eq!(member, "lead");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn a_borrowed_cell_reports_busy() {
        #[derive(Clone, Debug, Sanitize)]
        struct Holder {
            #[mask(Asterisk)]
            cell: Rc<RefCell<String>>,
        }

        let cell = Rc::new(RefCell::new("secret".to_string()));
        let mut holder = Holder {
            cell: Rc::clone(&cell),
        };
        let guard = cell.borrow();
        let err = mask(&mut holder).unwrap_err();
        assert!(err.to_string().starts_with("masking failed"));
        drop(guard);

        mask(&mut holder).unwrap();
        assert_eq!(*cell.borrow(), "******");
    }
}
