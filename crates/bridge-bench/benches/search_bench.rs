//! Search Engine linear scan cost at varying object-list sizes.
//!
//! `find` walks the session's bound object list comparing attribute
//! bytes; this is the cost a `C_FindObjectsInit`/`C_FindObjects` pair
//! pays once per matching pass over a token's (or the certificate
//! slot's) objects.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use bridge_core::attribute::{Attribute, AttributeStore, TemplateAttribute};
use bridge_core::constants::{CKA_CLASS, CKA_LABEL, CKO_CERTIFICATE, CKO_PUBLIC_KEY};
use bridge_core::object::{Object, ObjectClass};
use bridge_core::search;
use bridge_core::session::Session;

fn build_objects(count: usize) -> Vec<Object> {
    (0..count)
        .map(|i| Object {
            owning_identity: Some(i),
            class: if i % 2 == 0 {
                ObjectClass::Certificate
            } else {
                ObjectClass::PublicKey
            },
            attributes: AttributeStore::new(vec![
                Attribute::u64_attr(
                    CKA_CLASS,
                    if i % 2 == 0 { CKO_CERTIFICATE } else { CKO_PUBLIC_KEY },
                ),
                Attribute::bytes_attr(CKA_LABEL, format!("object-{i}")),
            ]),
        })
        .collect()
}

fn bench_find_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_full_scan");
    for size in [16usize, 256, 4096] {
        let objects = Arc::new(build_objects(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut session = Session::new(0, None, objects.clone());
                search::find_init(
                    &mut session,
                    vec![TemplateAttribute {
                        kind: CKA_CLASS,
                        value: Some(CKO_CERTIFICATE.to_le_bytes().to_vec()),
                    }],
                );
                search::find(&mut session, size).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_scan);
criterion_main!(benches);
