//! Property-based tests using QuickCheck

use quickcheck::{Arbitrary, Gen, QuickCheck};
use tessera_codegen::naming::{to_camel_case, to_kebab_case, to_pascal_case, to_snake_case};

/// ASCII letters and digits in words joined by `_` or `-`
#[derive(Clone, Debug)]
struct Identifier(String);

impl Arbitrary for Identifier {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        const SEPARATORS: &[char] = &['_', '-'];

        let words = 1 + usize::arbitrary(g) % 4;
        let mut s = String::new();
        for i in 0..words {
            if i > 0 {
                s.push(*g.choose(SEPARATORS).unwrap());
            }
            let len = 1 + usize::arbitrary(g) % 8;
            for _ in 0..len {
                s.push(*g.choose(ALPHABET).unwrap() as char);
            }
        }
        Identifier(s)
    }
}

/// Lowercase snake_case: `[a-z0-9]+(_[a-z0-9]+)*`
#[derive(Clone, Debug)]
struct SnakeIdentifier(String);

impl Arbitrary for SnakeIdentifier {
    fn arbitrary(g: &mut Gen) -> Self {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

        let words = 1 + usize::arbitrary(g) % 5;
        let words: Vec<String> = (0..words)
            .map(|_| {
                let len = 1 + usize::arbitrary(g) % 4;
                (0..len).map(|_| *g.choose(ALPHABET).unwrap() as char).collect()
            })
            .collect();
        SnakeIdentifier(words.join("_"))
    }
}

/// Compact words with acronym runs, e.g. `XMLHttpRequest` or `parseJSONValue2`
#[derive(Clone, Debug)]
struct CompactIdentifier(String);

impl Arbitrary for CompactIdentifier {
    fn arbitrary(g: &mut Gen) -> Self {
        const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

        let words = 1 + usize::arbitrary(g) % 4;
        let mut s = String::new();
        for _ in 0..words {
            if bool::arbitrary(g) {
                let len = 1 + usize::arbitrary(g) % 4;
                s.extend((0..len).map(|_| *g.choose(UPPER).unwrap() as char));
            } else {
                s.push(*g.choose(UPPER).unwrap() as char);
                let len = 1 + usize::arbitrary(g) % 6;
                s.extend((0..len).map(|_| *g.choose(LOWER).unwrap() as char));
            }
        }
        CompactIdentifier(s)
    }
}

fn all_idempotent(s: &str) -> bool {
    let conversions: [fn(&str) -> String; 4] =
        [to_camel_case, to_pascal_case, to_snake_case, to_kebab_case];
    conversions.iter().all(|convert| {
        let once = convert(s);
        convert(&once) == once
    })
}

/// Property: PascalCase survives a detour through snake_case
#[test]
fn prop_pascal_of_snake_is_pascal() {
    fn prop(id: Identifier) -> bool {
        to_pascal_case(&to_snake_case(&id.0)) == to_pascal_case(&id.0)
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(Identifier) -> bool);
}

/// Property: snake_case -> PascalCase -> snake_case gives back the input,
/// and so does the camelCase detour
#[test]
fn prop_snake_round_trips_through_compact_forms() {
    fn prop(id: SnakeIdentifier) -> bool {
        to_snake_case(&to_pascal_case(&id.0)) == id.0 && to_snake_case(&to_camel_case(&id.0)) == id.0
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(SnakeIdentifier) -> bool);
}

/// Property: every conversion is a no-op on its own output
#[test]
fn prop_conversions_are_idempotent() {
    fn prop(id: Identifier) -> bool {
        all_idempotent(&id.0)
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(Identifier) -> bool);
}

/// Property: idempotence holds for acronym-heavy compact identifiers too
#[test]
fn prop_acronym_identifiers_are_stable() {
    fn prop(id: CompactIdentifier) -> bool {
        all_idempotent(&id.0) && to_pascal_case(&to_snake_case(&id.0)) == to_pascal_case(&id.0)
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(CompactIdentifier) -> bool);
}

#[test]
fn known_identifiers_round_trip() {
    for (input, pascal) in [
        ("widget_id", "WidgetId"),
        ("status-index", "StatusIndex"),
        ("XMLHttpRequest", "XmlHttpRequest"),
        ("address2_line", "Address2Line"),
        ("a_b", "A_B"),
        ("x_y_z", "X_Y_Z"),
    ] {
        assert_eq!(to_pascal_case(input), pascal);
        assert_eq!(to_pascal_case(&to_snake_case(input)), pascal);
        assert_eq!(to_pascal_case(pascal), pascal);
        assert_eq!(to_camel_case(&to_camel_case(input)), to_camel_case(input));
    }
    assert_eq!(to_snake_case(&to_pascal_case("x_y_z")), "x_y_z");
}
