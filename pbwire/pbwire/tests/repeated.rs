
use pbwire::{FieldError, Message, Value};
use test_helpers::*;

fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::I32).collect()
}

// ── basic operations ─────────────────────────────────────────────────────────

#[test]
fn behaves_like_a_list() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");

    foo.repeated_mut("nums").unwrap().push(15).unwrap();
    foo.repeated_mut("nums").unwrap().push(32).unwrap();
    let mut nums = foo.repeated_mut("nums").unwrap();
    assert_eq!(nums.len(), 2);
    assert_eq!(nums[0], Value::I32(15));
    assert_eq!(nums[1], Value::I32(32));

    nums.set(1, 56).unwrap();
    assert_eq!(nums[1], Value::I32(56));
    assert_eq!(&nums[..1], &[Value::I32(15)]);

    nums.insert(0, 1).unwrap();
    assert_eq!(*nums, ints(&[1, 15, 56]));
    assert_eq!(nums.remove(1).unwrap(), Value::I32(15));
    assert_eq!(nums.pop(), Some(Value::I32(56)));
    assert_eq!(*nums, ints(&[1]));
}

#[test]
fn clear_and_reassign() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    foo.repeated_mut("nums").unwrap().push(15).unwrap().push(32).unwrap();
    foo.repeated_mut("nums").unwrap().clear();
    assert!(foo.repeated("nums").unwrap().is_empty());

    foo.repeated_mut("nums").unwrap().push(15).unwrap();
    assert_eq!(foo.repeated("nums").unwrap().len(), 1);

    foo.set("nums", Value::List(vec![])).unwrap();
    assert!(foo.repeated("nums").unwrap().is_empty());

    foo.repeated_mut("nums").unwrap().push(15).unwrap();
    foo.set_repeated("nums", [1, 3, 5]).unwrap();
    assert_eq!(foo.repeated("nums").unwrap(), ints(&[1, 3, 5]).as_slice());
}

#[test]
fn index_errors_are_reported() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    let mut nums = foo.repeated_mut("nums").unwrap();
    assert!(matches!(
        nums.set(0, 1),
        Err(FieldError::IndexOutOfBounds { index: 0, len: 0, .. })
    ));
    assert!(nums.insert(1, 1).is_err());
    nums.insert(0, 1).unwrap();
    assert!(nums.remove(3).is_err());
}

// ── derived containers ───────────────────────────────────────────────────────

#[test]
fn intersection_concat_and_map() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    let foo2 = Message::from_fields(
        descriptor(&reg, "nums.Foo"),
        [("nums", Value::List(ints(&[1, 2, 3])))],
    )
    .unwrap();

    foo.repeated_mut("nums").unwrap().push(1).unwrap();
    let nums = foo.repeated_mut("nums").unwrap();
    let other = foo2.repeated("nums").unwrap();

    assert_eq!(nums.intersection(other), ints(&[1]));
    assert_eq!(nums.concat(other.iter().cloned()).unwrap(), ints(&[1, 1, 2, 3]));
    assert_eq!(nums.difference(other), ints(&[]));

    let mut foo2 = foo2;
    foo2.repeated_mut("nums")
        .unwrap()
        .map_in_place(|v| v.as_i32().unwrap_or(0) + 1)
        .unwrap();
    assert_eq!(foo2.repeated("nums").unwrap(), ints(&[2, 3, 4]).as_slice());
}

#[test]
fn intersection_keeps_distinct_elements_in_order() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    foo.set_repeated("nums", [3, 1, 3, 2, 1]).unwrap();
    let nums = foo.repeated_mut("nums").unwrap();
    assert_eq!(nums.intersection(&ints(&[1, 3])), ints(&[3, 1]));
    assert_eq!(nums.difference(&ints(&[1])), ints(&[3, 3, 2]));
}

#[test]
fn concat_leaves_the_original_untouched() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    foo.set_repeated("nums", [1]).unwrap();
    let joined = foo.repeated_mut("nums").unwrap().concat([2, 3]).unwrap();
    assert_eq!(joined, ints(&[1, 2, 3]));
    assert_eq!(foo.repeated("nums").unwrap(), ints(&[1]).as_slice());
}

// ── type and range checks ────────────────────────────────────────────────────

#[test]
fn chained_push_keeps_elements_before_a_failure() {
    let reg = featureful();
    let mut a = new_message(&reg, "featureful.A");
    let sub = new_message(&reg, "featureful.A.Sub");

    a.repeated_mut("sub1").unwrap().push(sub.clone()).unwrap();

    let mut a = new_message(&reg, "featureful.A");
    let mut sub1 = a.repeated_mut("sub1").unwrap();
    let result = sub1
        .push(sub.clone())
        .and_then(|r| r.push("dummy string"))
        .map(|_| ());
    assert!(matches!(result, Err(FieldError::TypeMismatch { .. })));
    assert_eq!(
        a.repeated("sub1").unwrap(),
        &[Value::Message(Box::new(sub))]
    );
}

#[test]
fn bulk_assignment_is_all_or_nothing() {
    let reg = featureful();
    let mut a = new_message(&reg, "featureful.A");
    let sub = || Value::from(new_message(&reg, "featureful.A.Sub"));

    let err = a.set_repeated("sub1", [sub(), sub(), Value::I32(5), sub()]);
    assert!(matches!(err, Err(FieldError::TypeMismatch { .. })));
    assert!(a.repeated("sub1").unwrap().is_empty());
    assert!(!a.has("sub1").unwrap());

    let mut nums = a.repeated_mut("i1").unwrap();
    nums.extend([1, 2]).unwrap();
    assert!(nums.extend([Value::I32(3), Value::I64(1 << 32)]).is_err());
    assert_eq!(*nums, ints(&[1, 2]));
    assert!(nums.map_in_place(|_| 1i64 << 40).is_err());
    assert_eq!(*nums, ints(&[1, 2]));
}

#[test]
fn value_checks_apply_to_every_insertion() {
    let reg = nums();
    let mut foo = new_message(&reg, "nums.Foo");
    let mut nums = foo.repeated_mut("nums").unwrap();
    let result = nums
        .push(5)
        .and_then(|r| r.push(3))
        .and_then(|r| r.push(1i64 << 32))
        .map(|_| ());
    assert!(matches!(result, Err(FieldError::OutOfRange { .. })));
    assert_eq!(foo.repeated("nums").unwrap(), ints(&[5, 3]).as_slice());

    let mut nums = foo.repeated_mut("nums").unwrap();
    assert!(nums.set(0, 1i64 << 32).is_err());
    assert!(nums.insert(0, "x").is_err());
    assert!(nums.push(Value::List(vec![])).is_err());
}

#[test]
fn assigns_from_any_iterator() {
    let reg = registry(
        vec![
            pbwire::MessageDef::new(
                "iter.Bar",
                vec![pbwire::FieldDef::optional("i", 1, pbwire::ScalarType::Int32)],
            ),
            pbwire::MessageDef::new(
                "iter.Foo",
                vec![pbwire::FieldDef::repeated(
                    "nums",
                    1,
                    pbwire::FieldType::message("iter.Bar"),
                )],
            ),
        ],
        vec![],
    );
    let bar = descriptor(&reg, "iter.Bar");
    let make = |i: i32| Message::from_fields(bar.clone(), [("i", i)]).unwrap();

    let mut foo = new_message(&reg, "iter.Foo");
    foo.set_repeated("nums", (0..2).map(|n| make(n * 2 + 1))).unwrap();
    assert_eq!(
        foo.repeated("nums").unwrap(),
        &[Value::from(make(1)), Value::from(make(3))]
    );
}

#[test]
fn elements_of_repeated_messages_are_mutable() {
    let reg = featureful();
    let mut a = new_message(&reg, "featureful.A");
    a.repeated_mut("sub1")
        .unwrap()
        .push(new_message(&reg, "featureful.A.Sub"))
        .unwrap();

    let mut sub1 = a.repeated_mut("sub1").unwrap();
    sub1.message_mut(0).unwrap().set("payload", "x").unwrap();
    let stored = &a.repeated("sub1").unwrap()[0];
    assert_eq!(
        *stored.as_message().unwrap().get("payload").unwrap(),
        Value::String("x".into())
    );

    assert!(a.repeated_mut("i1").unwrap().message_mut(0).is_none());
}
