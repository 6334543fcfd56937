//! Canonical order-0 Huffman coding over whole bytes, in independently
//! decodable blocks capped at [`HUFFMAN_BLOCK_CAP`] bytes of input each.
//!
//! Each block stores its 256-entry code-length table (0 for unused symbols)
//! rather than the codes themselves; both sides derive the canonical codes
//! from the lengths with the same deterministic assignment, so there's
//! nothing to transmit beyond the lengths and the packed bitstream.

use crate::bitio::{BitReader, BitWriter};
use crate::constants::HUFFMAN_BLOCK_CAP;
use crate::errors::{CodecError, CodecResult};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug)]
enum Node {
  Leaf(u8),
  Internal(Box<Node>, Box<Node>),
}

fn build_tree(freqs: &[u64; 256]) -> Option<Node> {
  let mut heap: BinaryHeap<Reverse<(u64, u32, Node)>> = BinaryHeap::new();
  let mut tie_breaker = 0u32;
  for (symbol, &freq) in freqs.iter().enumerate() {
    if freq > 0 {
      heap.push(Reverse((freq, tie_breaker, Node::Leaf(symbol as u8))));
      tie_breaker += 1;
    }
  }
  if heap.is_empty() {
    return None;
  }
  while heap.len() > 1 {
    let Reverse((freq_a, _, a)) = heap.pop().unwrap();
    let Reverse((freq_b, _, b)) = heap.pop().unwrap();
    heap.push(Reverse((
      freq_a + freq_b,
      tie_breaker,
      Node::Internal(Box::new(a), Box::new(b)),
    )));
    tie_breaker += 1;
  }
  Some(heap.pop().unwrap().0 .2)
}

fn fill_lengths(node: &Node, depth: u8, lengths: &mut [u8; 256]) {
  match node {
    Node::Leaf(symbol) => lengths[*symbol as usize] = depth.max(1),
    Node::Internal(left, right) => {
      fill_lengths(left, depth + 1, lengths);
      fill_lengths(right, depth + 1, lengths);
    }
  }
}

fn code_lengths_for(block: &[u8]) -> [u8; 256] {
  let mut freqs = [0u64; 256];
  for &b in block {
    freqs[b as usize] += 1;
  }
  let mut lengths = [0u8; 256];
  if let Some(root) = build_tree(&freqs) {
    fill_lengths(&root, 0, &mut lengths);
  }
  lengths
}

/// Derives canonical codes (`(code, length)` per symbol, `length == 0`
/// meaning unused) from a lengths table. Both the encoder and decoder call
/// this so only the lengths need to be transmitted.
fn canonical_codes(lengths: &[u8; 256]) -> [(u32, u8); 256] {
  let max_len = *lengths.iter().max().unwrap_or(&0) as usize;
  let mut bl_count = vec![0u32; max_len + 1];
  for &len in lengths.iter() {
    if len > 0 {
      bl_count[len as usize] += 1;
    }
  }
  let mut next_code = vec![0u32; max_len + 2];
  let mut code = 0u32;
  for bits in 1..=max_len {
    code = (code + bl_count[bits - 1]) << 1;
    next_code[bits] = code;
  }
  let mut codes = [(0u32, 0u8); 256];
  for symbol in 0..256 {
    let len = lengths[symbol];
    if len > 0 {
      let c = next_code[len as usize];
      next_code[len as usize] += 1;
      codes[symbol] = (c, len);
    }
  }
  codes
}

fn encode_block(block: &[u8], out: &mut Vec<u8>) {
  let lengths = code_lengths_for(block);
  let codes = canonical_codes(&lengths);

  out.extend_from_slice(&(block.len() as u32).to_le_bytes());
  out.extend_from_slice(&lengths);

  let mut writer = BitWriter::new();
  for &b in block {
    let (code, len) = codes[b as usize];
    for i in (0..len).rev() {
      writer.write_bit((code >> i) & 1 != 0);
    }
  }
  let bits = writer_bit_count(block, &codes);
  let payload = writer.finish();
  out.extend_from_slice(&(bits as u32).to_le_bytes());
  out.extend_from_slice(&payload);
}

fn writer_bit_count(block: &[u8], codes: &[(u32, u8); 256]) -> u64 {
  block
    .iter()
    .map(|&b| codes[b as usize].1 as u64)
    .sum()
}

pub(crate) fn encode(data: &[u8]) -> CodecResult<Vec<u8>> {
  let mut out = Vec::new();
  if data.is_empty() {
    return Ok(out);
  }
  for block in data.chunks(HUFFMAN_BLOCK_CAP) {
    encode_block(block, &mut out);
  }
  Ok(out)
}

fn decode_block(lengths: &[u8; 256], bits: u64, bit_data: &[u8], block_len: usize) -> Vec<u8> {
  let codes = canonical_codes(lengths);
  // Build a decode tree directly from (code, length) pairs.
  let mut root = DecodeNode::default();
  for (symbol, &(code, len)) in codes.iter().enumerate() {
    if len > 0 {
      root.insert(code, len, symbol as u8);
    }
  }

  let mut reader = BitReader::new(bit_data);
  let mut out = Vec::with_capacity(block_len);
  let mut bits_consumed = 0u64;
  while out.len() < block_len {
    let mut node = &root;
    loop {
      let bit = reader.read_bit();
      bits_consumed += 1;
      node = if bit {
        node.one.as_deref().unwrap_or(&root)
      } else {
        node.zero.as_deref().unwrap_or(&root)
      };
      if let Some(symbol) = node.symbol {
        out.push(symbol);
        break;
      }
      if bits_consumed > bits {
        break;
      }
    }
  }
  out
}

#[derive(Default)]
struct DecodeNode {
  zero: Option<Box<DecodeNode>>,
  one: Option<Box<DecodeNode>>,
  symbol: Option<u8>,
}

impl DecodeNode {
  fn insert(&mut self, code: u32, len: u8, symbol: u8) {
    let mut node = self;
    for i in (0..len).rev() {
      let bit = (code >> i) & 1 != 0;
      node = if bit {
        node.one.get_or_insert_with(|| Box::new(DecodeNode::default()))
      } else {
        node.zero.get_or_insert_with(|| Box::new(DecodeNode::default()))
      };
    }
    node.symbol = Some(symbol);
  }
}

pub(crate) fn decode(payload: &[u8], decoded_len: usize) -> CodecResult<Vec<u8>> {
  let mut out = Vec::with_capacity(decoded_len);
  let mut offset = 0usize;
  while out.len() < decoded_len {
    if offset + 4 + 256 + 4 > payload.len() {
      return Err(CodecError::chunk_truncated(
        "huffman block header truncated",
      ));
    }
    let block_len =
      u32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap()) as usize;
    offset += 4;
    let mut lengths = [0u8; 256];
    lengths.copy_from_slice(&payload[offset..offset + 256]);
    offset += 256;
    let bits =
      u32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap()) as u64;
    offset += 4;
    let byte_len = ((bits + 7) / 8) as usize;
    if offset + byte_len > payload.len() {
      return Err(CodecError::chunk_truncated(
        "huffman block payload truncated",
      ));
    }
    let bit_data = &payload[offset..offset + byte_len];
    offset += byte_len;
    out.extend(decode_block(&lengths, bits, bit_data, block_len));
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_skewed_distribution() {
    let mut data = Vec::new();
    for _ in 0..10_000 {
      data.push(0u8);
    }
    for i in 0..500u32 {
      data.push((i % 256) as u8);
    }
    let encoded = encode(&data).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn round_trips_single_symbol() {
    let data = vec![42u8; 5000];
    let encoded = encode(&data).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn round_trips_across_multiple_blocks() {
    let data: Vec<u8> = (0..(HUFFMAN_BLOCK_CAP * 3 + 17))
      .map(|i| (i % 251) as u8)
      .collect();
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
