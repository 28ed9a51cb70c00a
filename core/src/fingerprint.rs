//! Source fingerprinting: a SHA-256 digest over a canonical textual
//! rendering of a (filtered, normalized) IR, used to detect drift between
//! the state a plan was computed against and the state it is applied to.

use sha2::{Digest, Sha256};

use crate::ir::Ir;
use crate::sqlgen::{render_dump, RenderOptions};

/// Hex-encoded SHA-256 of the canonical DDL rendering of `ir` restricted to
/// `schema_name`. Canonical here means: no comment blocks, no header, fixed
/// kind-ordinal section order, identity-ordered collections — everything
/// `Collection`'s `BTreeMap` backing and `render_dump` already guarantee, so
/// this is just "hash the plan-mode dump text".
pub fn fingerprint(ir: &Ir, schema_name: &str) -> String {
    let opts = RenderOptions {
        quote_all: false,
        with_comments: false,
        engine_version: String::new(),
    };
    let text = render_dump(ir, schema_name, &opts);
    let digest = Sha256::digest(text.as_bytes());
    hex(&digest)
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::ir::{Schema, Sequence};

    fn sample_ir() -> Ir {
        let mut ir = Ir::new();
        let mut schema = Schema::new("public");
        schema.sequences.push(Sequence {
            schema: "public".into(),
            name: "ids".into(),
            data_type: "bigint".into(),
            start: 1,
            increment: 1,
            min_value: 1,
            max_value: i64::MAX,
            cache: 1,
            cycle: false,
            owned_by: None,
        });
        ir.schemas.insert("public".into(), schema);
        ir
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let ir = sample_ir();
        assert_eq!(fingerprint(&ir, "public"), fingerprint(&ir, "public"));
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let ir_a = sample_ir();
        let mut ir_b = sample_ir();
        ir_b.schema_mut("public").sequences.delete(&Sequence {
            schema: "public".into(),
            name: "ids".into(),
            data_type: "bigint".into(),
            start: 1,
            increment: 1,
            min_value: 1,
            max_value: i64::MAX,
            cache: 1,
            cycle: false,
            owned_by: None,
        }.key());
        assert_ne!(fingerprint(&ir_a, "public"), fingerprint(&ir_b, "public"));
    }
}
