//! Optimal LZSS parsing shared by the dictionary formats.
//!
//! Every way of tokenizing an input forms a directed acyclic graph: the
//! nodes are positions in the input, and an edge (u,v) is one output token
//! covering positions u..v.  Weighting each edge by the number of bits the
//! token occupies makes a minimum-bits encoding the same thing as a
//! shortest path from node 0 to node N.  The graph is topologically sorted
//! by construction, so a single left-to-right relaxation finds that path.
//!
//! Everything format-specific comes in through the `LzssFormat` trait: the
//! symbol width, the shape of the descriptor field, the sliding windows and
//! their token kinds, per-kind bit costs, and hooks for tokens that are not
//! ordinary dictionary matches (Saxman zero-fill, LZKN1 packed literals).
//! The format modules then walk the returned edge list and emit the actual
//! bitstream through `LzssWriter`, or invert it through `LzssReader`.

use num_traits::PrimInt;
use crate::Error;
use crate::byteio::ByteReader;

/// distance carried by edges that are not positional matches, such as
/// zero-fill runs; never a legal match distance
pub const NO_DISTANCE: usize = usize::MAX;

/// One token of the optimal parse.  `pos` is the absolute position of the
/// first symbol covered.  Symbolwise edges have length 1, distance 0, and a
/// meaningful `symbol`; dictionary edges leave `symbol` at zero.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Edge<K: Copy,S: Copy> {
    pub pos: usize,
    pub kind: K,
    pub distance: usize,
    pub length: usize,
    pub symbol: S
}

impl <K: Copy,S: Copy> Edge<K,S> {
    pub fn dest(&self) -> usize {
        self.pos + self.length
    }
}

/// One sliding window attached to a format: how far back it can reach,
/// which match lengths it covers, and the edge kind it produces.
pub struct Window<K: 'static> {
    pub search_buf: usize,
    pub min_len: usize,
    pub look_ahead: usize,
    pub kind: K
}

/// Everything the parser needs to know about one format.
pub trait LzssFormat {
    /// 8-bit for most formats, 16-bit for Comper and ComperX
    type Symbol: PrimInt;
    /// the format's token kinds
    type Kind: Copy + Eq + std::fmt::Debug;

    const SYMBOLWISE: Self::Kind;
    /// width of the descriptor bitfield in bits
    const NUM_DESC_BITS: u32;
    /// descriptor bits consumed by the end-of-stream marker
    const NUM_TERM_BITS: u32;
    /// total bits of the end-of-stream marker, descriptor bits included;
    /// zero when the stream is delimited by a length field instead
    const TERMINATOR_WEIGHT: u32;
    /// true when the decoder fetches a fresh descriptor field the moment
    /// the previous one runs out, rather than at the next bit it needs
    const NEED_EARLY_DESCRIPTOR: bool;
    /// position where dictionary search becomes legal (Rocket pre-fills
    /// everything before this)
    const FIRST_MATCH_POSITION: usize;
    /// largest look-ahead of any window, used to size scratch buffers
    const LOOK_AHEAD_BUF_SIZE: usize;

    fn windows() -> &'static [Window<Self::Kind>];
    fn desc_bits(kind: Self::Kind) -> u32;
    fn edge_weight(kind: Self::Kind,length: usize) -> u32;
    /// Push format-specific candidate edges for the node at `base`.
    /// Returning true suppresses the window's ordinary matches for this
    /// node (Saxman replaces them with zero-fill); returning false keeps
    /// them in addition to whatever was pushed (LZKN1 packed literals).
    fn extra_matches(data: &[Self::Symbol],base: usize,ubound: usize,lbound: usize,
                     matches: &mut Vec<Edge<Self::Kind,Self::Symbol>>) -> bool {
        let _ = (data,base,ubound,lbound,matches);
        false
    }
    /// extra bits owed at the end of the stream; `pad_mask` comes from the
    /// moduled container on all-but-last chunks, 7 otherwise
    fn get_padding(total_bits: u64,pad_mask: u32) -> u64 {
        let _ = (total_bits,pad_mask);
        0
    }
}

/// The search buffer / look-ahead pair for one window, slid one node at a
/// time alongside the relaxation.
struct SlidingWindow<'a,K: Copy,S: PrimInt> {
    data: &'a [S],
    search_buf: usize,
    min_len: usize,
    base: usize,
    ubound: usize,
    lbound: usize,
    kind: K
}

impl <'a,K: Copy,S: PrimInt> SlidingWindow<'a,K,S> {
    fn create(data: &'a [S],spec: &Window<K>,first_match: usize) -> Self {
        Self {
            data,
            search_buf: spec.search_buf,
            min_len: spec.min_len,
            base: first_match,
            ubound: usize::min(first_match + spec.look_ahead,data.len()),
            lbound: first_match.saturating_sub(spec.search_buf),
            kind: spec.kind
        }
    }
    fn slide(&mut self) {
        if self.ubound != self.data.len() {
            self.ubound += 1;
        }
        if self.base != self.data.len() {
            self.base += 1;
        }
        if self.base - self.lbound > self.search_buf {
            self.lbound += 1;
        }
    }
    /// Brute-force longest match: walk candidate starts from nearest to
    /// farthest, extend each, keep the single best (nearest wins length
    /// ties), then emit one edge per legal prefix length.  All prefixes
    /// share the best match's distance.
    fn find_matches(&self,matches: &mut Vec<Edge<K,S>>) {
        matches.clear();
        if self.base == self.lbound {
            return;
        }
        let end = self.ubound - self.base;
        let mut best_pos = 0;
        let mut best_len = 0;
        let mut ii = self.base - 1;
        loop {
            let mut jj = 0;
            while jj < end && self.data[ii + jj] == self.data[self.base + jj] {
                jj += 1;
            }
            if best_len < jj {
                best_pos = ii;
                best_len = jj;
            }
            if jj == end || ii == self.lbound {
                break;
            }
            ii -= 1;
        }
        if best_len >= self.min_len {
            for len in self.min_len..=best_len {
                matches.push(Edge {
                    pos: self.base,
                    kind: self.kind,
                    distance: self.base - best_pos,
                    length: len,
                    symbol: S::zero()
                });
            }
        }
    }
}

fn relax<F: LzssFormat>(ii: usize,basedesc: u64,edge: &Edge<F::Kind,F::Symbol>,
                        num_nodes: usize,pad_mask: u32,
                        costs: &mut [u64],desc_costs: &mut [u64],
                        parents: &mut [usize],pedges: &mut [Option<Edge<F::Kind,F::Symbol>>]) {
    let next = edge.dest() - F::FIRST_MATCH_POSITION;
    let mut wgt = costs[ii] + F::edge_weight(edge.kind,edge.length) as u64;
    let mut desc_cost = basedesc + F::desc_bits(edge.kind) as u64;
    if next == num_nodes {
        // Ending node: charge the end-of-stream marker, then square up the
        // final descriptor field.  A field with zero bits left forces a
        // whole dummy field when the decoder fetches eagerly.
        wgt += F::TERMINATOR_WEIGHT as u64;
        desc_cost += F::NUM_TERM_BITS as u64;
        let desc_mod = desc_cost % F::NUM_DESC_BITS as u64;
        if desc_mod != 0 || F::NEED_EARLY_DESCRIPTOR {
            wgt += F::NUM_DESC_BITS as u64 - desc_mod;
            desc_cost += F::NUM_DESC_BITS as u64 - desc_mod;
        }
        wgt += F::get_padding(wgt,pad_mask);
    }
    if costs[next] > wgt {
        costs[next] = wgt;
        desc_costs[next] = desc_cost;
        parents[next] = ii;
        pedges[next] = Some(*edge);
    }
}

/// Compute the minimum-bits tokenization of `data`.  The first edge starts
/// at `F::FIRST_MATCH_POSITION`; everything before that is window pre-fill
/// supplied by the caller, not subject to encoding.  Cost ties go to the
/// earliest relaxed edge (symbolwise first, then each window's match
/// lengths in ascending order), which keeps the output deterministic.
pub fn find_optimal_parse<F: LzssFormat>(data: &[F::Symbol],pad_mask: u32) -> Vec<Edge<F::Kind,F::Symbol>> where <F as LzssFormat>::Kind: 'static {
    let num_nodes = data.len() - F::FIRST_MATCH_POSITION;
    let mut costs = vec![u64::MAX;num_nodes + 1];
    let mut desc_costs = vec![u64::MAX;num_nodes + 1];
    let mut parents = vec![0usize;num_nodes + 1];
    let mut pedges: Vec<Option<Edge<F::Kind,F::Symbol>>> = vec![None;num_nodes + 1];
    costs[0] = 0;
    desc_costs[0] = 0;

    let mut windows: Vec<SlidingWindow<F::Kind,F::Symbol>> = F::windows().iter()
        .map(|w| SlidingWindow::create(data,w,F::FIRST_MATCH_POSITION))
        .collect();
    let mut matches: Vec<Edge<F::Kind,F::Symbol>> = Vec::with_capacity(F::LOOK_AHEAD_BUF_SIZE);

    for ii in 0..num_nodes {
        let basedesc = desc_costs[ii];
        let symbolwise = Edge {
            pos: ii + F::FIRST_MATCH_POSITION,
            kind: F::SYMBOLWISE,
            distance: 0,
            length: 1,
            symbol: data[ii + F::FIRST_MATCH_POSITION]
        };
        relax::<F>(ii,basedesc,&symbolwise,num_nodes,pad_mask,
                   &mut costs,&mut desc_costs,&mut parents,&mut pedges);
        for win in windows.iter_mut() {
            matches.clear();
            let skip_normal = F::extra_matches(data,win.base,win.ubound,win.lbound,&mut matches);
            for edge in matches.iter() {
                relax::<F>(ii,basedesc,edge,num_nodes,pad_mask,
                           &mut costs,&mut desc_costs,&mut parents,&mut pedges);
            }
            if !skip_normal {
                win.find_matches(&mut matches);
                for edge in matches.iter() {
                    relax::<F>(ii,basedesc,edge,num_nodes,pad_mask,
                               &mut costs,&mut desc_costs,&mut parents,&mut pedges);
                }
            }
            win.slide();
        }
    }

    let mut parse: Vec<Edge<F::Kind,F::Symbol>> = Vec::new();
    let mut ii = num_nodes;
    while ii != 0 {
        let edge = pedges[ii].expect("optimal parse left a gap in the path");
        parse.push(edge);
        ii = parents[ii];
    }
    parse.reverse();
    parse
}

/// Layout of a format's descriptor bitfield.
#[derive(Clone,Copy)]
pub struct DescriptorSpec {
    /// 8 or 16 bits
    pub width: u32,
    /// for 16-bit fields, whether the word is stored little-endian
    pub little_endian_bytes: bool,
    /// true when the decoder consumes the low-order bit first
    pub little_endian_bits: bool,
    /// see `LzssFormat::NEED_EARLY_DESCRIPTOR`
    pub early_fetch: bool
}

/// Output stream of interleaved descriptor fields and payload bytes.
/// Payload is deferred until the descriptor field describing it is full,
/// giving the on-disk layout the decoder expects: field, then the bytes
/// its bits describe, then the next field.
pub struct LzssWriter {
    spec: DescriptorSpec,
    out: Vec<u8>,
    pending: Vec<u8>,
    bit_buf: u32,
    waiting: u32
}

impl LzssWriter {
    pub fn create(spec: DescriptorSpec) -> Self {
        Self { spec, out: Vec::new(), pending: Vec::new(), bit_buf: 0, waiting: 0 }
    }
    fn emit_field(&mut self) {
        let word = match self.spec.little_endian_bits {
            true => match self.spec.width {
                8 => (self.bit_buf as u8).reverse_bits() as u32,
                _ => (self.bit_buf as u16).reverse_bits() as u32
            },
            false => self.bit_buf
        };
        match self.spec.width {
            8 => self.out.push(word as u8),
            _ => match self.spec.little_endian_bytes {
                true => self.out.extend_from_slice(&u16::to_le_bytes(word as u16)),
                false => self.out.extend_from_slice(&u16::to_be_bytes(word as u16))
            }
        }
        self.bit_buf = 0;
        self.waiting = 0;
    }
    fn push_bit(&mut self,bit: u32) -> bool {
        self.bit_buf = (self.bit_buf << 1) | (bit & 1);
        self.waiting += 1;
        if self.waiting == self.spec.width {
            self.emit_field();
            return true;
        }
        false
    }
    fn flush_pending(&mut self) {
        self.out.append(&mut self.pending);
    }
    /// Add one descriptor bit.  The payload buffer is flushed at field
    /// boundaries; eager-fetch formats flush right after the field fills,
    /// the others just before a fresh field starts.
    pub fn descbit(&mut self,bit: u32) {
        if self.spec.early_fetch {
            if self.push_bit(bit) {
                self.flush_pending();
            }
        } else {
            if self.waiting == 0 {
                self.flush_pending();
            }
            self.push_bit(bit);
        }
    }
    /// queue a payload byte behind the current descriptor field
    pub fn putbyte(&mut self,byte: u8) {
        self.pending.push(byte);
    }
    /// Pad and emit the last descriptor field and whatever payload is
    /// still queued.  An eager-fetch decoder always reads one field past
    /// the last bit it used, so if the field ended exactly full a dummy
    /// all-zero field has to sit in front of the final payload.
    pub fn finish(mut self) -> Vec<u8> {
        let need_dummy = self.waiting == 0;
        if self.waiting != 0 {
            self.bit_buf <<= self.spec.width - self.waiting;
            self.emit_field();
        }
        if self.spec.early_fetch && need_dummy {
            for _i in 0..self.spec.width / 8 {
                self.out.push(0);
            }
        }
        self.flush_pending();
        self.out
    }
}

/// Input stream of interleaved descriptor fields and payload bytes,
/// inverting `LzssWriter`.  Fields are fetched lazily on the first bit
/// needed, or eagerly the moment the previous field runs out when the
/// format says so.
pub struct LzssReader<'a,'b> {
    spec: DescriptorSpec,
    src: &'b mut ByteReader<'a>,
    bit_buf: u32,
    remaining: u32
}

impl <'a,'b> LzssReader<'a,'b> {
    pub fn create(spec: DescriptorSpec,src: &'b mut ByteReader<'a>) -> Self {
        Self { spec, src, bit_buf: 0, remaining: 0 }
    }
    fn fetch(&mut self) -> Result<(),Error> {
        let word = match self.spec.width {
            8 => self.src.read1()? as u32,
            _ => match self.spec.little_endian_bytes {
                true => self.src.read2_le()? as u32,
                false => self.src.read2_be()? as u32
            }
        };
        self.bit_buf = match self.spec.little_endian_bits {
            true => match self.spec.width {
                8 => (word as u8).reverse_bits() as u32,
                _ => (word as u16).reverse_bits() as u32
            },
            false => word
        };
        self.remaining = self.spec.width;
        Ok(())
    }
    pub fn descbit(&mut self) -> Result<u32,Error> {
        if self.remaining == 0 {
            self.fetch()?;
        }
        self.remaining -= 1;
        let bit = (self.bit_buf >> self.remaining) & 1;
        if self.spec.early_fetch && self.remaining == 0 {
            self.fetch()?;
        }
        Ok(bit)
    }
    pub fn getbyte(&mut self) -> Result<u8,Error> {
        self.src.read1()
    }
    pub fn position(&self) -> usize {
        self.src.position()
    }
    pub fn source_at_end(&self) -> bool {
        self.src.at_end()
    }
}

#[cfg(test)]
fn desc_round_trip(spec: DescriptorSpec,bits: &[u32]) {
    let mut w = LzssWriter::create(spec);
    for &b in bits {
        w.descbit(b);
    }
    let out = w.finish();
    let mut src = ByteReader::new(&out);
    let mut r = LzssReader::create(spec,&mut src);
    for &b in bits {
        assert_eq!(r.descbit().unwrap(),b);
    }
}

#[test]
fn descriptor_bit_orders() {
    let bits = [1,0,1,1,0,0,1,0,1,1,1];
    desc_round_trip(DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: false, early_fetch: false },&bits);
    desc_round_trip(DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: true, early_fetch: false },&bits);
    desc_round_trip(DescriptorSpec { width: 16, little_endian_bytes: false, little_endian_bits: false, early_fetch: false },&bits);
    desc_round_trip(DescriptorSpec { width: 16, little_endian_bytes: true, little_endian_bits: true, early_fetch: true },&bits);
}

#[test]
fn descriptor_layout_msb_first() {
    let spec = DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: false, early_fetch: false };
    let mut w = LzssWriter::create(spec);
    w.descbit(1);
    w.descbit(0);
    w.descbit(1);
    assert_eq!(w.finish(),vec![0b10100000]);
}

#[test]
fn descriptor_layout_lsb_first() {
    let spec = DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: true, early_fetch: false };
    let mut w = LzssWriter::create(spec);
    w.descbit(1);
    w.descbit(0);
    w.descbit(1);
    assert_eq!(w.finish(),vec![0b00000101]);
}

#[test]
fn payload_interleaves_at_field_boundary() {
    // 8 descriptor bits then one more; the first field's payload must land
    // between the two fields
    let spec = DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: false, early_fetch: false };
    let mut w = LzssWriter::create(spec);
    for i in 0..8 {
        w.descbit(i & 1);
        w.putbyte(0x10 + i as u8);
    }
    w.descbit(1);
    w.putbyte(0x20);
    let out = w.finish();
    assert_eq!(out[0],0b01010101);
    assert_eq!(&out[1..9],&[0x10,0x11,0x12,0x13,0x14,0x15,0x16,0x17]);
    assert_eq!(out[9],0b10000000);
    assert_eq!(out[10],0x20);
}

#[test]
fn dummy_field_on_exact_boundary_when_eager() {
    let spec = DescriptorSpec { width: 8, little_endian_bytes: false, little_endian_bits: false, early_fetch: true };
    let mut w = LzssWriter::create(spec);
    for _i in 0..8 {
        w.descbit(1);
    }
    w.putbyte(0xAA);
    let out = w.finish();
    // field, dummy field, then the payload queued after the boundary
    assert_eq!(out,vec![0xFF,0x00,0xAA]);
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    // Toy format: 1-bit descriptor per token, 8-bit literals, matches cost
    // a descriptor bit plus 16 bits regardless of length.
    struct Toy;
    #[derive(Clone,Copy,Debug,PartialEq,Eq)]
    enum ToyKind { Literal, Match }
    impl LzssFormat for Toy {
        type Symbol = u8;
        type Kind = ToyKind;
        const SYMBOLWISE: ToyKind = ToyKind::Literal;
        const NUM_DESC_BITS: u32 = 8;
        const NUM_TERM_BITS: u32 = 0;
        const TERMINATOR_WEIGHT: u32 = 0;
        const NEED_EARLY_DESCRIPTOR: bool = false;
        const FIRST_MATCH_POSITION: usize = 0;
        const LOOK_AHEAD_BUF_SIZE: usize = 16;
        fn windows() -> &'static [Window<ToyKind>] {
            &[Window { search_buf: 32, min_len: 2, look_ahead: 16, kind: ToyKind::Match }]
        }
        fn desc_bits(_kind: ToyKind) -> u32 {
            1
        }
        fn edge_weight(kind: ToyKind,_length: usize) -> u32 {
            match kind {
                ToyKind::Literal => 9,
                ToyKind::Match => 17
            }
        }
    }

    #[test]
    fn incompressible_input_is_all_literals() {
        let data = [1u8,2,3,4,5];
        let parse = find_optimal_parse::<Toy>(&data,7);
        assert_eq!(parse.len(),5);
        for (i,edge) in parse.iter().enumerate() {
            assert_eq!(edge.kind,ToyKind::Literal);
            assert_eq!(edge.pos,i);
            assert_eq!(edge.symbol,data[i]);
        }
    }

    #[test]
    fn repeated_run_collapses_to_one_match() {
        let data = [7u8;10];
        let parse = find_optimal_parse::<Toy>(&data,7);
        // one literal, then a single distance-1 match covering the rest
        assert_eq!(parse.len(),2);
        assert_eq!(parse[0].kind,ToyKind::Literal);
        assert_eq!(parse[1].kind,ToyKind::Match);
        assert_eq!(parse[1].distance,1);
        assert_eq!(parse[1].length,9);
    }

    #[test]
    fn two_symbol_match_beats_literals() {
        // a 2-symbol match costs 17 bits against 18 for two literals
        let data = [1u8,2,1,2];
        let parse = find_optimal_parse::<Toy>(&data,7);
        assert_eq!(parse.len(),3);
        assert_eq!(parse[0].kind,ToyKind::Literal);
        assert_eq!(parse[1].kind,ToyKind::Literal);
        assert_eq!(parse[2],Edge { pos: 2, kind: ToyKind::Match, distance: 2, length: 2, symbol: 0 });
    }

    /// every candidate edge out of node `u`, rebuilt from scratch
    fn toy_candidates(data: &[u8],u: usize) -> Vec<Edge<ToyKind,u8>> {
        let mut out = vec![Edge { pos: u, kind: ToyKind::Literal, distance: 0, length: 1, symbol: data[u] }];
        let max_len = usize::min(16,data.len() - u);
        for len in 2..=max_len {
            let lo = u.saturating_sub(32);
            for s in (lo..u).rev() {
                if (0..len).all(|k| data[s + k] == data[u + k]) {
                    out.push(Edge { pos: u, kind: ToyKind::Match, distance: u - s, length: len, symbol: 0 });
                    break;
                }
            }
        }
        out
    }

    fn toy_cost(parse: &[Edge<ToyKind,u8>]) -> u64 {
        let mut bits = 0u64;
        let mut desc = 0u64;
        for e in parse {
            bits += Toy::edge_weight(e.kind,e.length) as u64;
            desc += 1;
        }
        let m = desc % 8;
        match m {
            0 => bits,
            _ => bits + 8 - m
        }
    }

    /// exhaustive minimum over every tokenization of `data`
    fn toy_best_cost(data: &[u8],u: usize,bits: u64,desc: u64,best: &mut u64) {
        if u == data.len() {
            let m = desc % 8;
            let total = bits + match m { 0 => 0, _ => 8 - m };
            *best = u64::min(*best,total);
            return;
        }
        for e in toy_candidates(data,u) {
            toy_best_cost(data,e.dest(),bits + Toy::edge_weight(e.kind,e.length) as u64,desc + 1,best);
        }
    }

    #[test]
    fn parse_is_minimal_over_all_tokenizations() {
        let cases: Vec<Vec<u8>> = vec![
            vec![7;10],
            vec![1,2,1,2,1,2,1,2],
            vec![1,2,3,4,1,2,3,4,1,2],
            vec![5,5,5,9,5,5,5,9,9],
            vec![1,1,2,2,3,3,1,1,2,2]
        ];
        for data in cases {
            let parse = find_optimal_parse::<Toy>(&data,7);
            let mut best = u64::MAX;
            toy_best_cost(&data,0,0,0,&mut best);
            assert_eq!(toy_cost(&parse),best,"parse of {:?} is not minimal",data);
        }
    }

    #[test]
    fn parse_covers_input_exactly() {
        let data = [3u8,3,3,1,2,3,3,3,3,1,2];
        let parse = find_optimal_parse::<Toy>(&data,7);
        let mut pos = 0;
        for edge in parse.iter() {
            assert_eq!(edge.pos,pos);
            pos = edge.dest();
        }
        assert_eq!(pos,data.len());
    }
}
