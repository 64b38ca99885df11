//! Fixture builders for the wire envelopes, so tests don't repeat the same
//! struct literals.

use std::collections::BTreeMap;

use relay_protocol::{RequestEnvelope, ResponseEnvelope, ResultBundle};

pub fn sample_request(code: &str, id: &str, tool: &str) -> RequestEnvelope {
    RequestEnvelope {
        code: code.to_owned(),
        id: id.to_owned(),
        tool: tool.to_owned(),
        args: BTreeMap::new(),
    }
}

pub fn sample_response(code: &str, id: &str, text: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        code: code.to_owned(),
        id: id.to_owned(),
        result: ResultBundle::text(text),
    }
}
