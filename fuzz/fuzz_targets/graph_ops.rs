#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{arbitrary, fuzz_target};
use scl_graph::core::graph::fuzzing::{arbitrary_ops, check_ops, GraphOp};

#[derive(Debug)]
struct TestCase {
    ops: Vec<GraphOp>,
}

impl Arbitrary<'_> for TestCase {
    fn arbitrary(u: &mut Unstructured<'_>) -> arbitrary::Result<Self> {
        let ops = arbitrary_ops(u, false)?;
        Ok(TestCase { ops })
    }
}

fuzz_target!(|testcase: TestCase| {
    check_ops(&testcase.ops);
});
