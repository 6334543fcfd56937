//! A tANS (table-based asymmetric numeral system) entropy backend, adapted
//! from an order-0 byte-alphabet table instead of the richer per-latent
//! token alphabet this design is normally paired with. One table covers an
//! entire stream; there's no block subdivision the way the Huffman backend
//! has, since a single 256-entry table is cheap regardless of stream size.

use crate::bitio::{BitReader, BitWriter};
use crate::constants::FSE_MAX_SIZE_LOG;
use crate::errors::{CodecError, CodecResult};
use std::cmp::max;

type Weight = u32;
type Bitlen = u32;
type Symbol = u8;
type AnsState = u32;

fn choose_stride(table_size: Weight) -> Weight {
  let mut res = (3 * table_size) / 5;
  if res % 2 == 0 {
    res += 1;
  }
  res
}

struct Spec {
  size_log: Bitlen,
  state_symbols: Vec<Symbol>,
  symbol_weights: Vec<Weight>,
}

impl Spec {
  fn spread_state_symbols(size_log: Bitlen, symbol_weights: &[Weight]) -> CodecResult<Vec<Symbol>> {
    let table_size = symbol_weights.iter().sum::<Weight>();
    if table_size != (1 << size_log) {
      return Err(CodecError::backend_failure(format!(
        "fse table size log {} disagrees with total weight {}",
        size_log, table_size
      )));
    }
    let mut res = vec![0u8; table_size as usize];
    let mut step = 0;
    let stride = choose_stride(table_size);
    let mod_table_size = Weight::MAX >> 1 >> (Weight::BITS as Bitlen - 1 - size_log);
    for (symbol, &weight) in symbol_weights.iter().enumerate() {
      for _ in 0..weight {
        let state_idx = (stride * step) & mod_table_size;
        res[state_idx as usize] = symbol as Symbol;
        step += 1;
      }
    }
    Ok(res)
  }

  fn from_weights(size_log: Bitlen, symbol_weights: Vec<Weight>) -> CodecResult<Self> {
    let state_symbols = Self::spread_state_symbols(size_log, &symbol_weights)?;
    Ok(Self {
      size_log,
      state_symbols,
      symbol_weights,
    })
  }

  fn table_size(&self) -> usize {
    1 << self.size_log
  }
}

struct SymbolInfo {
  renorm_bit_cutoff: AnsState,
  min_renorm_bits: Bitlen,
  next_states: Vec<AnsState>,
}

impl SymbolInfo {
  #[inline]
  fn next_state_for(&self, x_s: AnsState) -> AnsState {
    self.next_states[x_s as usize - self.next_states.len()]
  }
}

struct Encoder {
  symbol_infos: Vec<SymbolInfo>,
  size_log: Bitlen,
}

impl Encoder {
  fn new(spec: &Spec) -> Self {
    let table_size = spec.table_size();
    let mut symbol_infos = spec
      .symbol_weights
      .iter()
      .map(|&weight| {
        let max_x_s = 2 * weight - 1;
        let min_renorm_bits = spec.size_log - max_x_s.ilog2() as Bitlen;
        let renorm_bit_cutoff = (2 * weight * (1 << min_renorm_bits)) as AnsState;
        SymbolInfo {
          renorm_bit_cutoff,
          min_renorm_bits,
          next_states: Vec::with_capacity(weight as usize),
        }
      })
      .collect::<Vec<_>>();

    for (state_idx, &symbol) in spec.state_symbols.iter().enumerate() {
      symbol_infos[symbol as usize]
        .next_states
        .push((table_size + state_idx) as AnsState);
    }

    Self {
      symbol_infos,
      size_log: spec.size_log,
    }
  }

  #[inline]
  fn encode(&self, state: AnsState, symbol: Symbol) -> (AnsState, Bitlen) {
    let symbol_info = &self.symbol_infos[symbol as usize];
    let renorm_bits = if state >= symbol_info.renorm_bit_cutoff {
      symbol_info.min_renorm_bits + 1
    } else {
      symbol_info.min_renorm_bits
    };
    (
      symbol_info.next_state_for(state >> renorm_bits),
      renorm_bits,
    )
  }

  fn default_state(&self) -> AnsState {
    1 << self.size_log
  }
}

struct Node {
  symbol: Symbol,
  next_state_idx_base: AnsState,
  bits_to_read: Bitlen,
}

struct Decoder {
  nodes: Vec<Node>,
}

impl Decoder {
  fn new(spec: &Spec) -> Self {
    let table_size = spec.table_size();
    let mut nodes = Vec::with_capacity(table_size);
    let mut symbol_x_s = spec.symbol_weights.clone();
    for &symbol in &spec.state_symbols {
      let mut next_state_base = symbol_x_s[symbol as usize] as AnsState;
      let mut bits_to_read = 0;
      while next_state_base < table_size as AnsState {
        next_state_base *= 2;
        bits_to_read += 1;
      }
      nodes.push(Node {
        symbol,
        next_state_idx_base: next_state_base - table_size as AnsState,
        bits_to_read,
      });
      symbol_x_s[symbol as usize] += 1;
    }
    Self { nodes }
  }
}

fn quantize_weights_to(counts: &[Weight], total_count: usize, size_log: Bitlen) -> Vec<Weight> {
  if size_log == 0 {
    return vec![1];
  }
  let required_weight_sum = 1 << size_log;
  let multiplier = required_weight_sum as f32 / total_count as f32;
  let desired_surplus_per_bin = counts
    .iter()
    .map(|&count| (count as f32 * multiplier - 1.0).max(0.0))
    .collect::<Vec<_>>();
  let desired_surplus = desired_surplus_per_bin.iter().sum::<f32>();
  let required_surplus = required_weight_sum - counts.len() as Weight;
  let surplus_mult = if desired_surplus == 0.0 {
    0.0
  } else {
    required_surplus as f32 / desired_surplus
  };
  let float_weights = desired_surplus_per_bin
    .iter()
    .map(|&surplus| 1.0 + surplus * surplus_mult)
    .collect::<Vec<_>>();

  let mut weights = float_weights
    .iter()
    .map(|&weight| weight.round() as Weight)
    .collect::<Vec<_>>();
  let mut weight_sum = weights.iter().sum::<Weight>();

  let mut i = 0;
  while weight_sum > required_weight_sum {
    if weights[i] > 1 && weights[i] as f32 > float_weights[i] {
      weights[i] -= 1;
      weight_sum -= 1;
    }
    i = (i + 1) % weights.len();
  }
  i = 0;
  while weight_sum < required_weight_sum {
    if (weights[i] as f32) < float_weights[i] {
      weights[i] += 1;
      weight_sum += 1;
    }
    i = (i + 1) % weights.len();
  }
  weights
}

fn quantize_weights(counts: Vec<Weight>, total_count: usize, max_size_log: Bitlen) -> (Bitlen, Vec<Weight>) {
  if counts.len() == 1 {
    return (0, vec![1]);
  }
  let min_size_log = (usize::BITS - (counts.len() - 1).leading_zeros()) as Bitlen;
  let mut size_log = max(min_size_log, max_size_log);
  let mut weights = quantize_weights_to(&counts, total_count, size_log);

  let power_of_2 = weights.iter().map(|&w| w.trailing_zeros()).min().unwrap() as Bitlen;
  size_log -= power_of_2;
  for weight in &mut weights {
    *weight >>= power_of_2;
  }
  (size_log, weights)
}

pub(crate) fn encode(data: &[u8]) -> CodecResult<Vec<u8>> {
  let mut out = Vec::new();
  if data.is_empty() {
    out.push(0u8);
    return Ok(out);
  }

  let mut freqs = [0u32; 256];
  for &b in data {
    freqs[b as usize] += 1;
  }
  let symbols_used: Vec<u8> = (0..256u32)
    .filter(|&s| freqs[s as usize] > 0)
    .map(|s| s as u8)
    .collect();

  if symbols_used.len() == 1 {
    out.push(1u8);
    out.push(symbols_used[0]);
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    return Ok(out);
  }

  out.push(symbols_used.len() as u8);
  let counts: Vec<u32> = symbols_used.iter().map(|&s| freqs[s as usize]).collect();
  let (size_log, weights) = quantize_weights(counts, data.len(), FSE_MAX_SIZE_LOG);
  out.push(size_log as u8);
  for (&symbol, &weight) in symbols_used.iter().zip(weights.iter()) {
    out.push(symbol);
    out.extend_from_slice(&weight.to_le_bytes());
  }

  let spec = Spec::from_weights(size_log, weights)?;
  let encoder = Encoder::new(&spec);
  let mut sym_to_token = [0u8; 256];
  for (token, &symbol) in symbols_used.iter().enumerate() {
    sym_to_token[symbol as usize] = token as u8;
  }

  let mut state = encoder.default_state();
  let mut steps = Vec::with_capacity(data.len());
  for &b in data.iter().rev() {
    let token = sym_to_token[b as usize];
    let (new_state, bitlen) = encoder.encode(state, token);
    steps.push((state, bitlen));
    state = new_state;
  }

  out.extend_from_slice(&state.to_le_bytes());
  out.extend_from_slice(&(data.len() as u64).to_le_bytes());

  let mut writer = BitWriter::new();
  for &(word, bitlen) in steps.iter().rev() {
    writer.write_bits(word, bitlen);
  }
  let bitstream = writer.finish();
  out.extend_from_slice(&(bitstream.len() as u32).to_le_bytes());
  out.extend_from_slice(&bitstream);

  Ok(out)
}

pub(crate) fn decode(payload: &[u8], decoded_len: usize) -> CodecResult<Vec<u8>> {
  if payload.is_empty() {
    return Err(CodecError::chunk_truncated("fse payload missing header"));
  }
  if decoded_len == 0 {
    return Ok(Vec::new());
  }
  let symbol_count = payload[0] as usize;
  if symbol_count == 1 {
    if payload.len() < 1 + 1 + 8 {
      return Err(CodecError::chunk_truncated("fse single-symbol header truncated"));
    }
    let symbol = payload[1];
    return Ok(vec![symbol; decoded_len]);
  }

  let mut offset = 1usize;
  if offset >= payload.len() {
    return Err(CodecError::chunk_truncated("fse size_log missing"));
  }
  let size_log = payload[offset] as Bitlen;
  offset += 1;

  let mut symbols = Vec::with_capacity(symbol_count);
  let mut weights = Vec::with_capacity(symbol_count);
  for _ in 0..symbol_count {
    if offset + 5 > payload.len() {
      return Err(CodecError::chunk_truncated("fse symbol table truncated"));
    }
    symbols.push(payload[offset]);
    let weight = u32::from_le_bytes(payload[offset + 1..offset + 5].try_into().unwrap());
    weights.push(weight);
    offset += 5;
  }

  if offset + 4 + 8 + 4 > payload.len() {
    return Err(CodecError::chunk_truncated("fse stream trailer truncated"));
  }
  let final_state = u32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap());
  offset += 4;
  let token_count =
    u64::from_le_bytes(payload[offset..offset + 8].try_into().unwrap()) as usize;
  offset += 8;
  let bitstream_len =
    u32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap()) as usize;
  offset += 4;
  if offset + bitstream_len > payload.len() {
    return Err(CodecError::chunk_truncated("fse bitstream truncated"));
  }
  let bit_data = &payload[offset..offset + bitstream_len];

  let spec = Spec::from_weights(size_log, weights)?;
  let decoder = Decoder::new(&spec);
  let table_size = spec.table_size() as AnsState;

  let mut reader = BitReader::new(bit_data);
  let mut state_idx = final_state - table_size;
  let mut out = Vec::with_capacity(token_count);
  for _ in 0..token_count {
    let node = &decoder.nodes[state_idx as usize];
    out.push(symbols[node.symbol as usize]);
    let extra = reader.read_bits(node.bits_to_read);
    state_idx = node.next_state_idx_base + extra;
  }

  if out.len() != decoded_len {
    return Err(CodecError::backend_failure(
      "fse decode produced a different length than declared",
    ));
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_skewed_distribution() {
    let mut data = Vec::new();
    for i in 0..20_000u32 {
      data.push(if i % 10 == 0 { (i % 256) as u8 } else { 7u8 });
    }
    let encoded = encode(&data).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn round_trips_single_symbol() {
    let data = vec![99u8; 4096];
    let encoded = encode(&data).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn round_trips_uniform_distribution() {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
    let encoded = encode(&data).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn empty_input_round_trips() {
    let encoded = encode(&[]).unwrap();
    let decoded = decode(&encoded, 0).unwrap();
    assert!(decoded.is_empty());
  }
}
