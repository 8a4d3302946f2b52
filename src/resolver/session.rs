use crate::dns::ResourceRecord;

///State of one walk down the delegation tree for one node.
///
///A resend to another nameserver reuses `transaction_id`, and picks from the
///`nameservers` of the last reply that decoded cleanly. Nested lookups (a
///nameserver's own address) get a session of their own.
#[derive(Debug, Default)]
pub struct Session {
    pub transaction_id: u16,
    pub nameservers: Vec<ResourceRecord>,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }
}
